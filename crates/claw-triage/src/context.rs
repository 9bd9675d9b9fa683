//! Evaluation context shared by analyzers in one pass.

use crate::apidoc::ApiDocs;
use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use crate::evaluator::ConditionText;
use crate::store::{GroupVersion, ResourceClient, ResourceQuery, ResourceStore};
use crate::types::ResourceObject;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything an analyzer needs for one evaluation pass.
///
/// The context owns a ready store handle and a cancellation token. Every
/// query an analyzer issues goes through [`AnalysisContext::list`], so
/// cancelling the token or hitting the query deadline aborts the analyzer
/// instead of truncating its results.
#[derive(Clone)]
pub struct AnalysisContext {
    store: Arc<dyn ResourceStore>,
    cancel: CancellationToken,
    query_timeout: Option<Duration>,
    namespace: Option<String>,
    kinds: Vec<String>,
    condition_text: ConditionText,
    sort_findings: bool,
    docs: Arc<ApiDocs>,
}

impl std::fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("query_timeout", &self.query_timeout)
            .field("namespace", &self.namespace)
            .field("kinds", &self.kinds)
            .field("condition_text", &self.condition_text)
            .field("sort_findings", &self.sort_findings)
            .finish_non_exhaustive()
    }
}

impl AnalysisContext {
    /// Creates a context over a store, with no deadline and no scope.
    #[must_use]
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self {
            store,
            cancel: CancellationToken::new(),
            query_timeout: None,
            namespace: None,
            kinds: Vec::new(),
            condition_text: ConditionText::default(),
            sort_findings: false,
            docs: Arc::new(ApiDocs::default()),
        }
    }

    /// Creates a context configured from a [`TriageConfig`].
    #[must_use]
    pub fn from_config(store: Arc<dyn ResourceStore>, config: &TriageConfig) -> Self {
        let mut context = Self::new(store)
            .with_condition_text(config.condition_text)
            .with_sorted_findings(config.sort_findings)
            .with_kinds(config.analyzers.iter().cloned());
        context.query_timeout = config.query_timeout();
        context.namespace.clone_from(&config.namespace);
        context
    }

    /// Uses the given cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sets the per-query deadline.
    #[must_use]
    pub const fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Restricts top-level listings to one namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restricts the pass to the given analyzer kinds.
    #[must_use]
    pub fn with_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Selects which condition field becomes failure text.
    #[must_use]
    pub const fn with_condition_text(mut self, text: ConditionText) -> Self {
        self.condition_text = text;
        self
    }

    /// Sorts findings by kind and identity at the end of the pass.
    #[must_use]
    pub const fn with_sorted_findings(mut self, sort: bool) -> Self {
        self.sort_findings = sort;
        self
    }

    /// Uses the given field documentation for failure references.
    #[must_use]
    pub fn with_docs(mut self, docs: ApiDocs) -> Self {
        self.docs = Arc::new(docs);
        self
    }

    /// The cancellation token for this pass.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The namespace top-level listings are restricted to.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The analyzer kinds selected for this pass; empty means all.
    #[must_use]
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// The condition text source.
    #[must_use]
    pub const fn condition_text(&self) -> ConditionText {
        self.condition_text
    }

    /// Whether findings are sorted at the end of the pass.
    #[must_use]
    pub const fn sort_findings(&self) -> bool {
        self.sort_findings
    }

    /// Field documentation for failure references.
    #[must_use]
    pub fn docs(&self) -> &ApiDocs {
        &self.docs
    }

    /// Returns a client for an API group.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Transport`] if the store cannot build one.
    pub fn client_for(&self, api: &GroupVersion) -> Result<Arc<dyn ResourceClient>> {
        self.store.client_for(api)
    }

    /// Runs a list query, bound to this context's cancellation and deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Cancelled`] if the token fires first,
    /// [`TriageError::Timeout`] if the deadline passes first, or the
    /// client's own error.
    pub async fn list(
        &self,
        client: &dyn ResourceClient,
        query: &ResourceQuery,
    ) -> Result<Vec<ResourceObject>> {
        if self.cancel.is_cancelled() {
            return Err(TriageError::Cancelled {
                resource: query.resource.clone(),
            });
        }

        let fetch = async {
            match self.query_timeout {
                Some(timeout) => match tokio::time::timeout(timeout, client.list(query)).await {
                    Ok(result) => result,
                    Err(_) => Err(TriageError::Timeout {
                        resource: query.resource.clone(),
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    }),
                },
                None => client.list(query).await,
            }
        };

        let items = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                return Err(TriageError::Cancelled {
                    resource: query.resource.clone(),
                });
            }
            result = fetch => result?,
        };

        debug!(query = %query, items = items.len(), "listed resources");
        Ok(items)
    }
}
