//! Failure propagation from a parent resource to its dependents.

use crate::context::AnalysisContext;
use crate::error::Result;
use crate::evaluator::ConditionEvaluator;
use crate::store::{ResourceClient, ResourceQuery};
use crate::types::{ConditionSeverity, ConditionedStatus, Failure};
use tracing::debug;

/// Collects failures from resources that depend on a failed parent.
///
/// Dependents are listed in the parent's namespace and evaluated with a
/// severity-tier rule. Their failures are folded into the parent's finding;
/// dependents never produce findings of their own.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    resource: String,
    evaluator: ConditionEvaluator,
}

impl CascadeResolver {
    /// Creates a resolver for the dependent resource that flags
    /// error-severity conditions.
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            evaluator: ConditionEvaluator::severity_tier(ConditionSeverity::Error),
        }
    }

    /// Replaces the evaluator applied to dependents.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: ConditionEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// The dependent resource this resolver lists.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Lists dependents in `namespace` and returns their failures.
    ///
    /// An empty namespace (a cluster-scoped parent) lists dependents across
    /// all namespaces.
    ///
    /// # Errors
    ///
    /// Propagates any listing or decode error unchanged; nothing is merged
    /// when the query fails.
    pub async fn resolve(
        &self,
        ctx: &AnalysisContext,
        client: &dyn ResourceClient,
        namespace: &str,
    ) -> Result<Vec<Failure>> {
        let query = ResourceQuery::all(self.resource.clone())
            .in_namespace(Some(namespace).filter(|ns| !ns.is_empty()));
        let children = ctx.list(client, &query).await?;

        let mut failures = Vec::new();
        for child in &children {
            let status: ConditionedStatus = child.decode_status(&self.resource)?;
            failures.extend(self.evaluator.evaluate_conditions(&status.conditions));
        }

        debug!(
            resource = %self.resource,
            namespace,
            children = children.len(),
            failures = failures.len(),
            "resolved dependent failures"
        );
        Ok(failures)
    }
}
