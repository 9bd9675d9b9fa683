//! Per-invocation deduplication of findings.

use crate::types::{Failure, Finding, ResourceIdentity};
use std::collections::HashMap;

/// Collects failures into at most one [`Finding`] per resource.
///
/// Entries are keyed by `namespace/name`. Recording a resource a second time
/// appends to its existing finding in discovery order. One aggregator
/// belongs to a single analyzer invocation and is consumed when flattened.
#[derive(Debug)]
pub struct FindingAggregator {
    kind: String,
    index: HashMap<String, Finding>,
}

impl FindingAggregator {
    /// Creates an empty aggregator for an analyzer kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            index: HashMap::new(),
        }
    }

    /// The analyzer kind findings are recorded under.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Records failures for a resource.
    ///
    /// An empty batch is ignored, so every finding carries at least one failure.
    pub fn record(&mut self, identity: &ResourceIdentity, failures: Vec<Failure>) {
        if failures.is_empty() {
            return;
        }
        self.index
            .entry(identity.key())
            .or_insert_with(|| Finding::new(self.kind.clone(), identity.clone()))
            .extend(failures);
    }

    /// Returns the number of distinct resources recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Flattens the index into findings.
    ///
    /// The order of the returned findings is unspecified.
    #[must_use]
    pub fn into_findings(self) -> Vec<Finding> {
        self.index.into_values().collect()
    }
}
