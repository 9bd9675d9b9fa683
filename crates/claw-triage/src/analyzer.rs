//! Analyzer contract and registry.
//!
//! Every resource kind is handled by one [`Analyzer`]. The
//! [`AnalyzerRegistry`] keeps them keyed by kind, runs the selected ones
//! concurrently, and merges their findings into an [`AnalysisReport`] once
//! all of them have completed.

use crate::analyzers::{CarvelAppAnalyzer, ClusterApiAnalyzer};
use crate::context::AnalysisContext;
use crate::error::{Result, TriageError};
use crate::store::BoxFuture;
use crate::types::Finding;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Inspects one resource kind and reports failing instances.
pub trait Analyzer: Send + Sync {
    /// The kind identifier findings are reported under.
    fn kind(&self) -> &str;

    /// Lists the kind's resources and returns one finding per failing instance.
    ///
    /// Every returned finding has at least one failure. Output order is
    /// unspecified.
    ///
    /// # Errors
    ///
    /// Any fetch, transport, cancellation or decode error aborts the
    /// invocation; partial results are never returned.
    fn analyze<'a>(&'a self, ctx: &'a AnalysisContext) -> BoxFuture<'a, Result<Vec<Finding>>>;
}

/// An analyzer invocation that failed.
#[derive(Debug)]
pub struct AnalyzerFailure {
    /// Kind of the failed analyzer.
    pub kind: String,
    /// The error that aborted it.
    pub error: TriageError,
}

/// Merged output of one registry pass.
#[derive(Debug)]
pub struct AnalysisReport {
    /// Unique identifier for this pass.
    pub id: Uuid,
    /// When the pass started.
    pub started_at: DateTime<Utc>,
    /// Duration of the pass in milliseconds.
    pub duration_ms: u64,
    /// Findings from every analyzer that completed.
    pub findings: Vec<Finding>,
    /// Analyzers that failed, with their errors.
    pub failures: Vec<AnalyzerFailure>,
}

impl AnalysisReport {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            duration_ms: 0,
            findings: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Returns true if no findings were produced and no analyzer failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.failures.is_empty()
    }

    /// Returns true if any analyzer failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns the findings reported under `kind`.
    #[must_use]
    pub fn findings_for(&self, kind: &str) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.kind() == kind).collect()
    }

    /// Returns the error for `kind`, if that analyzer failed.
    #[must_use]
    pub fn failure_for(&self, kind: &str) -> Option<&TriageError> {
        self.failures
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| &f.error)
    }

    /// Sorts findings by kind, then by identity.
    pub fn sort_by_identity(&mut self) {
        self.findings
            .sort_by(|a, b| (a.kind(), a.identity()).cmp(&(b.kind(), b.identity())));
    }
}

/// Analyzers keyed by the kind they handle.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<String, Arc<dyn Analyzer>>,
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerRegistry")
            .field("kinds", &self.analyzers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AnalyzerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in analyzer.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for analyzer in [
            Arc::new(ClusterApiAnalyzer::new()) as Arc<dyn Analyzer>,
            Arc::new(CarvelAppAnalyzer::new()),
        ] {
            registry.analyzers.insert(analyzer.kind().to_string(), analyzer);
        }
        registry
    }

    /// Registers an analyzer under its kind.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::DuplicateAnalyzer`] if the kind is taken.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> Result<()> {
        let kind = analyzer.kind().to_string();
        if self.analyzers.contains_key(&kind) {
            return Err(TriageError::DuplicateAnalyzer(kind));
        }
        self.analyzers.insert(kind, analyzer);
        Ok(())
    }

    /// Returns the analyzer for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Analyzer>> {
        self.analyzers.get(kind)
    }

    /// Returns the registered kinds in sorted order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.analyzers.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered analyzers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    /// Returns true if no analyzers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Runs the analyzers selected by the context and merges their output.
    ///
    /// Analyzers run concurrently. A failed analyzer is recorded in
    /// [`AnalysisReport::failures`] and contributes no findings; the others
    /// are unaffected. Each requested kind runs once, however often it is
    /// named. Kinds requested by the context but not registered are reported
    /// as [`TriageError::UnknownAnalyzer`].
    pub async fn run(&self, ctx: &AnalysisContext) -> AnalysisReport {
        let start = Instant::now();
        let mut report = AnalysisReport::new();

        let mut selected: Vec<&Arc<dyn Analyzer>> = Vec::new();
        if ctx.kinds().is_empty() {
            selected.extend(self.analyzers.values());
        } else {
            let requested: BTreeSet<&String> = ctx.kinds().iter().collect();
            for kind in requested {
                match self.analyzers.get(kind) {
                    Some(analyzer) => selected.push(analyzer),
                    None => report.failures.push(AnalyzerFailure {
                        kind: kind.clone(),
                        error: TriageError::UnknownAnalyzer(kind.clone()),
                    }),
                }
            }
        }

        let outcomes = join_all(selected.iter().map(|analyzer| async move {
            (analyzer.kind().to_string(), analyzer.analyze(ctx).await)
        }))
        .await;

        for (kind, outcome) in outcomes {
            match outcome {
                Ok(findings) => {
                    info!(kind = %kind, findings = findings.len(), "analyzer completed");
                    report.findings.extend(findings);
                }
                Err(error) => {
                    warn!(kind = %kind, error = %error, "analyzer failed");
                    report.failures.push(AnalyzerFailure { kind, error });
                }
            }
        }

        if ctx.sort_findings() {
            report.sort_by_identity();
        }
        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        report
    }
}
