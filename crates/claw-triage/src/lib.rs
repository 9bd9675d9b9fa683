//! # claw-triage
//!
//! Custom resource triage for Clawbernetes.
//!
//! This crate inspects the live status of custom resources, detects failure
//! conditions, and aggregates them into one structured finding per failing
//! resource. Each finding's kind selects a prompt template that an
//! explanation backend can fill in.
//!
//! ## Features
//!
//! - **Pluggable Analyzers**: One [`Analyzer`] per resource kind, kept in an [`AnalyzerRegistry`]
//! - **Per-Kind Failure Rules**: Severity tiers or `(type, status)` signatures
//! - **Dependent Resources**: Failures of children folded into their parent's finding
//! - **Deduplication**: At most one [`Finding`] per resource and kind
//! - **Prompt Selection**: Kind-specific templates with a default fallback
//!
//! ## Quick Start
//!
//! ```rust
//! use claw_triage::{
//!     fill_template, AnalyzerRegistry, Condition, ConditionEvaluator, ConditionSeverity,
//!     PromptTemplates, StatusSignals,
//! };
//!
//! // Flag error-severity conditions
//! let evaluator = ConditionEvaluator::severity_tier(ConditionSeverity::Error);
//! let conditions = vec![Condition::new("Ready", "False")
//!     .with_severity(ConditionSeverity::Error)
//!     .with_message("infrastructure not ready")];
//! let signals = StatusSignals {
//!     conditions: &conditions,
//!     ..StatusSignals::default()
//! };
//! let evaluation = evaluator.evaluate(&signals, "Clusters.metadata.name");
//! assert!(evaluation.condition_failed);
//!
//! // Every built-in kind is registered
//! let registry = AnalyzerRegistry::with_builtin();
//! assert_eq!(registry.kinds(), vec!["Clusters", "apps"]);
//!
//! // Kinds without their own template use the default one
//! let prompts = PromptTemplates::builtin();
//! let template = prompts.select("Clusters");
//! let prompt = fill_template(template, "english", &evaluation.failures[0].text);
//! assert!(prompt.contains("infrastructure not ready"));
//! ```
//!
//! ## Modules
//!
//! - [`analyzer`]: The analyzer contract, registry and report
//! - [`analyzers`]: Built-in analyzers
//! - [`evaluator`]: Failure rules over status conditions
//! - [`cascade`]: Parent-to-dependent failure propagation
//! - [`aggregator`]: Per-resource deduplication
//! - [`prompts`]: Explanation template selection
//! - [`store`]: Resource store interface; [`memory`] provides an in-process store

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod analyzer;
pub mod analyzers;
pub mod apidoc;
pub mod cascade;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod memory;
pub mod prompts;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use aggregator::FindingAggregator;
pub use analyzer::{AnalysisReport, Analyzer, AnalyzerFailure, AnalyzerRegistry};
pub use analyzers::{CarvelAppAnalyzer, ClusterApiAnalyzer};
pub use apidoc::{ApiDocs, ApiReference};
pub use cascade::CascadeResolver;
pub use config::TriageConfig;
pub use context::AnalysisContext;
pub use error::{Result, TriageError};
pub use evaluator::{ConditionEvaluator, ConditionText, Evaluation, FailureRule, StatusSignals};
pub use memory::MemoryStore;
pub use prompts::{fill_template, PromptTemplates};
pub use store::{BoxFuture, GroupVersion, ResourceClient, ResourceQuery, ResourceStore};
pub use types::{
    Condition, ConditionSeverity, ConditionedStatus, Failure, Finding, ObjectMeta,
    ResourceIdentity, ResourceObject,
};
