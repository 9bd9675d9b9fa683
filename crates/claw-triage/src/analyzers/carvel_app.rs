//! Carvel kapp-controller app analyzer.

use crate::aggregator::FindingAggregator;
use crate::analyzer::Analyzer;
use crate::apidoc::ApiReference;
use crate::context::AnalysisContext;
use crate::error::Result;
use crate::evaluator::{ConditionEvaluator, StatusSignals};
use crate::store::{BoxFuture, GroupVersion, ResourceQuery};
use crate::types::{null_as_default, Condition, Finding};
use serde::Deserialize;

/// Kind identifier for Carvel apps.
pub const KIND: &str = "apps";

/// Resource listed for apps.
pub const RESOURCE: &str = "apps";

/// Condition types that mark an app as failed when `True`.
pub const FAILED_CONDITIONS: [&str; 2] = ["ReconcileFailed", "DeleteFailed"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppStatus {
    #[serde(default)]
    useful_error_message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    conditions: Vec<Condition>,
}

/// Reports Carvel apps whose reconcile or delete has failed.
///
/// At most one failure is reported per app, taken from the app's
/// `usefulErrorMessage`.
#[derive(Debug, Clone)]
pub struct CarvelAppAnalyzer {
    api: GroupVersion,
}

impl CarvelAppAnalyzer {
    /// Creates the analyzer for `kappctrl.k14s.io/v1alpha1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api: GroupVersion::new("kappctrl.k14s.io", "v1alpha1"),
        }
    }

    /// The API group apps are listed from.
    #[must_use]
    pub const fn api(&self) -> &GroupVersion {
        &self.api
    }

    async fn run(&self, ctx: &AnalysisContext) -> Result<Vec<Finding>> {
        let client = ctx.client_for(&self.api)?;
        let query = ResourceQuery::all(RESOURCE).in_namespace(ctx.namespace());
        let apps = ctx.list(client.as_ref(), &query).await?;

        let doc_ref = ApiReference {
            kind: KIND,
            api: &self.api,
            docs: ctx.docs(),
        }
        .doc_for("metadata.name");
        let evaluator = ConditionEvaluator::signature(FAILED_CONDITIONS, "True")
            .with_text_source(ctx.condition_text());

        let mut aggregator = FindingAggregator::new(KIND);
        for app in &apps {
            let status: AppStatus = app.decode_status(RESOURCE)?;
            let signals = StatusSignals {
                useful_error_message: status.useful_error_message.as_deref(),
                conditions: &status.conditions,
                ..StatusSignals::default()
            };
            let evaluation = evaluator.evaluate(&signals, &doc_ref);
            aggregator.record(&app.identity(), evaluation.failures);
        }

        Ok(aggregator.into_findings())
    }
}

impl Default for CarvelAppAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for CarvelAppAnalyzer {
    fn kind(&self) -> &str {
        KIND
    }

    fn analyze<'a>(&'a self, ctx: &'a AnalysisContext) -> BoxFuture<'a, Result<Vec<Finding>>> {
        Box::pin(self.run(ctx))
    }
}
