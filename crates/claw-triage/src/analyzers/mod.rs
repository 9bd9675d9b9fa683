//! Built-in analyzers, one per supported resource kind.
//!
//! - [`ClusterApiAnalyzer`]: Cluster API `Clusters`, with failures of the
//!   cluster's `Machines` folded in.
//! - [`CarvelAppAnalyzer`]: Carvel kapp-controller `apps`.

pub mod carvel_app;
pub mod cluster_api;

pub use carvel_app::CarvelAppAnalyzer;
pub use cluster_api::ClusterApiAnalyzer;
