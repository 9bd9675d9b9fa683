//! Error types for the claw-triage crate.

use thiserror::Error;

/// Errors that can occur while triaging cluster resources.
#[derive(Debug, Error)]
pub enum TriageError {
    /// The resource store could not be reached or rejected the request.
    #[error("failed to list {resource}: {reason}")]
    Fetch {
        /// The resource being listed.
        resource: String,
        /// The reason the listing failed.
        reason: String,
    },

    /// A REST client could not be constructed for an API group.
    #[error("cannot build client for {group_version}: {reason}")]
    Transport {
        /// The API group/version the client was requested for.
        group_version: String,
        /// The reason the client could not be built.
        reason: String,
    },

    /// The analysis context was cancelled while a query was in flight.
    #[error("query for {resource} cancelled")]
    Cancelled {
        /// The resource being listed when cancellation fired.
        resource: String,
    },

    /// A query exceeded the per-query deadline.
    #[error("query for {resource} timed out after {timeout_ms}ms")]
    Timeout {
        /// The resource being listed.
        resource: String,
        /// The deadline that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// A listed item carried a status that could not be decoded.
    #[error("malformed status on {resource} {name}: {source}")]
    Decode {
        /// The resource kind being decoded.
        resource: String,
        /// The identity key of the offending item.
        name: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// An analyzer for this kind is already registered.
    #[error("analyzer already registered: {0}")]
    DuplicateAnalyzer(String),

    /// No analyzer is registered for this kind.
    #[error("no analyzer registered for kind: {0}")]
    UnknownAnalyzer(String),

    /// A prompt template does not carry exactly two substitution slots.
    #[error("template for {kind} has {slots} slots, expected 2")]
    InvalidTemplate {
        /// The kind the template was registered for.
        kind: String,
        /// The number of slots found.
        slots: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TriageError {
    /// Returns true if the error came from cancellation or a query deadline.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Timeout { .. })
    }

    /// Returns true if the error came from the resource store or its transport.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Transport { .. })
    }
}

/// Result type for triage operations.
pub type Result<T> = std::result::Result<T, TriageError>;
