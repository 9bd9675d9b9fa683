//! Cluster API cluster analyzer.

use crate::aggregator::FindingAggregator;
use crate::analyzer::Analyzer;
use crate::apidoc::ApiReference;
use crate::cascade::CascadeResolver;
use crate::context::AnalysisContext;
use crate::error::Result;
use crate::evaluator::{ConditionEvaluator, StatusSignals};
use crate::store::{BoxFuture, GroupVersion, ResourceQuery};
use crate::types::{null_as_default, Condition, ConditionSeverity, Finding};
use serde::Deserialize;

/// Kind identifier for Cluster API clusters.
pub const KIND: &str = "Clusters";

/// Resource listed for clusters.
pub const RESOURCE: &str = "Clusters";

/// Dependent resource listed when a cluster has failed.
pub const MACHINES: &str = "Machines";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterStatus {
    #[serde(default)]
    failure_message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    conditions: Vec<Condition>,
}

/// Reports failing Cluster API clusters.
///
/// A cluster fails when it carries a failure message or an error-severity
/// condition. Error conditions also trigger a listing of the machines in the
/// cluster's namespace, whose error conditions join the cluster's finding.
#[derive(Debug, Clone)]
pub struct ClusterApiAnalyzer {
    api: GroupVersion,
}

impl ClusterApiAnalyzer {
    /// Creates the analyzer for `cluster.x-k8s.io/v1beta1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api: GroupVersion::new("cluster.x-k8s.io", "v1beta1"),
        }
    }

    /// The API group clusters and machines are listed from.
    #[must_use]
    pub const fn api(&self) -> &GroupVersion {
        &self.api
    }

    async fn run(&self, ctx: &AnalysisContext) -> Result<Vec<Finding>> {
        let client = ctx.client_for(&self.api)?;
        let query = ResourceQuery::all(RESOURCE).in_namespace(ctx.namespace());
        let clusters = ctx.list(client.as_ref(), &query).await?;

        let doc_ref = ApiReference {
            kind: KIND,
            api: &self.api,
            docs: ctx.docs(),
        }
        .doc_for("metadata.name");
        let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error)
            .with_text_source(ctx.condition_text());
        let machines = CascadeResolver::new(MACHINES).with_evaluator(evaluator.clone());

        let mut aggregator = FindingAggregator::new(KIND);
        for cluster in &clusters {
            let status: ClusterStatus = cluster.decode_status(RESOURCE)?;
            let signals = StatusSignals {
                failure_message: status.failure_message.as_deref(),
                conditions: &status.conditions,
                ..StatusSignals::default()
            };
            let evaluation = evaluator.evaluate(&signals, &doc_ref);
            let identity = cluster.identity();

            let cascade = evaluation.condition_failed;
            aggregator.record(&identity, evaluation.failures);
            if cascade {
                let dependents = machines
                    .resolve(ctx, client.as_ref(), cluster.namespace())
                    .await?;
                aggregator.record(&identity, dependents);
            }
        }

        Ok(aggregator.into_findings())
    }
}

impl Default for ClusterApiAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for ClusterApiAnalyzer {
    fn kind(&self) -> &str {
        KIND
    }

    fn analyze<'a>(&'a self, ctx: &'a AnalysisContext) -> BoxFuture<'a, Result<Vec<Finding>>> {
        Box::pin(self.run(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TriageError;
    use crate::evaluator::ConditionText;
    use crate::memory::MemoryStore;
    use crate::types::{Failure, ResourceObject};
    use serde_json::json;
    use std::sync::Arc;

    fn capi() -> GroupVersion {
        ClusterApiAnalyzer::new().api().clone()
    }

    fn error_condition(reason: &str, message: &str) -> serde_json::Value {
        json!({
            "type": "Ready",
            "status": "False",
            "severity": "Error",
            "reason": reason,
            "message": message,
        })
    }

    fn cluster(namespace: &str, name: &str, status: serde_json::Value) -> ResourceObject {
        ResourceObject::new(namespace, name).with_status(status)
    }

    async fn analyze(store: MemoryStore) -> Result<Vec<Finding>> {
        let ctx = AnalysisContext::new(Arc::new(store));
        ClusterApiAnalyzer::new().analyze(&ctx).await
    }

    #[tokio::test]
    async fn healthy_clusters_produce_nothing() {
        let store = MemoryStore::new().with_object(
            &capi(),
            RESOURCE,
            cluster("capi", "ok", json!({"conditions": [{"type": "Ready", "status": "True"}]})),
        );

        let findings = analyze(store.clone()).await.expect("analyze");

        assert!(findings.is_empty());
        assert_eq!(store.query_count(MACHINES), 0);
    }

    #[tokio::test]
    async fn failure_message_without_error_conditions_skips_machines() {
        let store = MemoryStore::new().with_object(
            &capi(),
            RESOURCE,
            cluster("capi", "prod", json!({"failureMessage": "control plane unreachable"})),
        );

        let findings = analyze(store.clone()).await.expect("analyze");

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name(), "capi/prod");
        assert_eq!(findings[0].failures().len(), 1);
        assert_eq!(findings[0].failures()[0].text, "control plane unreachable");
        assert!(
            findings[0].failures()[0]
                .doc_ref
                .as_deref()
                .is_some_and(|d| !d.is_empty())
        );
        assert_eq!(store.query_count(MACHINES), 0);
    }

    #[tokio::test]
    async fn error_condition_cascades_to_machines() {
        let store = MemoryStore::new()
            .with_object(
                &capi(),
                RESOURCE,
                cluster(
                    "capi",
                    "prod",
                    json!({"conditions": [error_condition("InfraFailed", "vpc missing")]}),
                ),
            )
            .with_object(
                &capi(),
                MACHINES,
                cluster(
                    "capi",
                    "prod-md-0",
                    json!({"conditions": [error_condition("BootFailed", "bootstrap timed out")]}),
                ),
            );

        let findings = analyze(store.clone()).await.expect("analyze");

        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].failures(),
            [Failure::new("vpc missing"), Failure::new("bootstrap timed out")]
        );
        assert_eq!(store.query_count(MACHINES), 1);
    }

    #[tokio::test]
    async fn machines_are_never_findings_on_their_own() {
        let store = MemoryStore::new().with_object(
            &capi(),
            MACHINES,
            cluster(
                "capi",
                "orphan",
                json!({"conditions": [error_condition("BootFailed", "no cluster")]}),
            ),
        );

        let findings = analyze(store).await.expect("analyze");
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn machine_query_failure_aborts() {
        let store = MemoryStore::new().with_object(
            &capi(),
            RESOURCE,
            cluster(
                "capi",
                "prod",
                json!({"conditions": [error_condition("InfraFailed", "vpc missing")]}),
            ),
        );
        store.fail_resource(MACHINES, "forbidden");

        let err = analyze(store).await.expect_err("should fail");
        assert!(matches!(err, TriageError::Fetch { ref resource, .. } if resource == MACHINES));
    }

    #[tokio::test]
    async fn transport_error_propagates() {
        let store = MemoryStore::new();
        store.reject_group(&capi(), "no REST mapping");

        let err = analyze(store).await.expect_err("should fail");
        assert!(matches!(err, TriageError::Transport { .. }));
    }

    #[tokio::test]
    async fn reason_text_source() {
        let store = MemoryStore::new().with_object(
            &capi(),
            RESOURCE,
            cluster(
                "capi",
                "prod",
                json!({"conditions": [error_condition("InfraFailed", "vpc missing")]}),
            ),
        );
        let ctx = AnalysisContext::new(Arc::new(store))
            .with_condition_text(ConditionText::Reason);

        let findings = ClusterApiAnalyzer::new().analyze(&ctx).await.expect("analyze");
        assert_eq!(findings[0].failures()[0].text, "InfraFailed");
    }

    #[tokio::test]
    async fn namespace_scope_limits_clusters() {
        let store = MemoryStore::new()
            .with_object(&capi(), RESOURCE, cluster("a", "one", json!({"failureMessage": "x"})))
            .with_object(&capi(), RESOURCE, cluster("b", "two", json!({"failureMessage": "y"})));
        let ctx = AnalysisContext::new(Arc::new(store)).with_namespace("b");

        let findings = ClusterApiAnalyzer::new().analyze(&ctx).await.expect("analyze");

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name(), "b/two");
    }
}
