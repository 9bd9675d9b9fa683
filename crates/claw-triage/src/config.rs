//! Triage configuration.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file is a valid configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::evaluator::ConditionText;
use crate::prompts::count_slots;

/// Configuration for an analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TriageConfig {
    /// Target language for explanation templates.
    pub language: String,
    /// Which condition field becomes failure text.
    pub condition_text: ConditionText,
    /// Whether findings are sorted by kind and identity before being returned.
    pub sort_findings: bool,
    /// Per-query deadline in seconds; 0 disables it.
    pub query_timeout_secs: u64,
    /// Restricts top-level listings to one namespace.
    pub namespace: Option<String>,
    /// Restricts the pass to these analyzer kinds; empty runs all of them.
    pub analyzers: Vec<String>,
    /// Prompt template overrides keyed by kind.
    pub prompts: BTreeMap<String, String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            language: "english".to_string(),
            condition_text: ConditionText::default(),
            sort_findings: true,
            query_timeout_secs: 30,
            namespace: None,
            analyzers: Vec::new(),
            prompts: BTreeMap::new(),
        }
    }
}

impl TriageConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TriageError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| TriageError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(TriageError::Config("language cannot be empty".to_string()));
        }

        if self.namespace.as_deref().is_some_and(|ns| ns.trim().is_empty()) {
            return Err(TriageError::Config(
                "namespace cannot be empty when set".to_string(),
            ));
        }

        if self.analyzers.iter().any(|kind| kind.trim().is_empty()) {
            return Err(TriageError::Config(
                "analyzer names cannot be empty".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        if let Some(kind) = self.analyzers.iter().find(|kind| !seen.insert(kind.as_str())) {
            return Err(TriageError::Config(format!(
                "analyzer '{kind}' is listed more than once"
            )));
        }

        for (kind, template) in &self.prompts {
            let slots = count_slots(template);
            if slots != 2 {
                return Err(TriageError::InvalidTemplate {
                    kind: kind.clone(),
                    slots,
                });
            }
        }

        Ok(())
    }

    /// Returns the per-query deadline, if enabled.
    #[must_use]
    pub const fn query_timeout(&self) -> Option<Duration> {
        if self.query_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.query_timeout_secs))
        }
    }
}
