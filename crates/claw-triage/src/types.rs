//! Core types for resource triage.
//!
//! This module defines the data structures shared by every analyzer: resource
//! identities, failure records, aggregated findings, and the minimal resource
//! shape the triage core reads from the cluster.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a single resource instance within one analysis pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentity {
    /// Namespace of the resource (empty for cluster-scoped resources).
    pub namespace: String,
    /// Name of the resource.
    pub name: String,
}

impl ResourceIdentity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns the `namespace/name` key used to deduplicate findings.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A single human-readable failure signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Failure {
    /// Description of the failure.
    pub text: String,
    /// Reference documentation for the failing field, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ref: Option<String>,
}

impl Failure {
    /// Creates a failure without a documentation reference.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            doc_ref: None,
        }
    }

    /// Attaches a documentation reference.
    #[must_use]
    pub fn with_doc_ref(mut self, doc_ref: impl Into<String>) -> Self {
        self.doc_ref = Some(doc_ref.into());
        self
    }
}

/// Aggregated failures for one resource instance.
///
/// A finding is built by the [`FindingAggregator`](crate::aggregator::FindingAggregator)
/// and is read-only once handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    kind: String,
    identity: ResourceIdentity,
    failures: Vec<Failure>,
}

impl Finding {
    pub(crate) fn new(kind: impl Into<String>, identity: ResourceIdentity) -> Self {
        Self {
            kind: kind.into(),
            identity,
            failures: Vec::new(),
        }
    }

    pub(crate) fn extend(&mut self, failures: impl IntoIterator<Item = Failure>) {
        self.failures.extend(failures);
    }

    /// The analyzer kind that produced this finding.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The resource this finding describes.
    #[must_use]
    pub const fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    /// The `namespace/name` key of the resource.
    #[must_use]
    pub fn name(&self) -> String {
        self.identity.key()
    }

    /// Failures in discovery order.
    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Joins all failure texts into the payload handed to an explanation template.
    #[must_use]
    pub fn error_payload(&self) -> String {
        self.failures
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decodes an explicit `null` the same way as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Severity tier attached to a status condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConditionSeverity {
    /// The condition reports an error.
    Error,
    /// The condition reports a warning.
    Warning,
    /// The condition is informational.
    Info,
    /// No severity, or one this crate does not recognise.
    #[default]
    #[serde(other)]
    None,
}

impl fmt::Display for ConditionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "Error"),
            Self::Warning => write!(f, "Warning"),
            Self::Info => write!(f, "Info"),
            Self::None => write!(f, ""),
        }
    }
}

/// A status condition as reported by a custom resource controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. `Ready` or `ReconcileFailed`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Condition status: `True`, `False` or `Unknown`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Severity tier, when the controller sets one.
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: ConditionSeverity,
    /// Machine-readable reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    /// Creates a condition with the given type and status.
    #[must_use]
    pub fn new(type_: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    /// Sets the severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: ConditionSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Object metadata the triage core relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ObjectMeta {
    /// Resource name.
    pub name: String,
    /// Resource namespace; absent for cluster-scoped resources.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// A resource instance as returned by the resource store.
///
/// Only metadata is interpreted here. Each analyzer decodes the `status`
/// payload into its own typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceObject {
    /// API version, e.g. `cluster.x-k8s.io/v1beta1`.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Kind, e.g. `Cluster`.
    #[serde(default)]
    pub kind: Option<String>,
    /// Object metadata.
    pub metadata: ObjectMeta,
    /// Raw status payload.
    #[serde(default)]
    pub status: serde_json::Value,
}

impl ResourceObject {
    /// Creates an object with the given namespace and name and an empty status.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: (!namespace.is_empty()).then_some(namespace),
            },
            ..Self::default()
        }
    }

    /// Sets the raw status payload.
    #[must_use]
    pub fn with_status(mut self, status: serde_json::Value) -> Self {
        self.status = status;
        self
    }

    /// Returns the namespace, or an empty string for cluster-scoped objects.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    /// Returns the identity of this object.
    #[must_use]
    pub fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(self.namespace(), self.metadata.name.clone())
    }

    /// Decodes the status payload into a typed view.
    ///
    /// A missing status decodes to the view's default.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Decode`](crate::TriageError::Decode) if the
    /// payload does not match the view.
    pub fn decode_status<T>(&self, resource: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.status.is_null() {
            return Ok(T::default());
        }
        T::deserialize(&self.status).map_err(|source| crate::TriageError::Decode {
            resource: resource.to_string(),
            name: self.identity().key(),
            source,
        })
    }
}

/// Status view shared by resources that only expose conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConditionedStatus {
    /// Status conditions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<Condition>,
}
