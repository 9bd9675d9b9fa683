//! Interface to the cluster resource store.
//!
//! The triage core never builds or authenticates a cluster client itself. It
//! asks a [`ResourceStore`] for a [`ResourceClient`] bound to an API group and
//! issues read-only list queries through it.

use crate::error::Result;
use crate::types::ResourceObject;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future type for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An API group and version, e.g. `cluster.x-k8s.io/v1beta1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersion {
    /// API group.
    pub group: String,
    /// API version within the group.
    pub version: String,
}

impl GroupVersion {
    /// Creates a new group/version pair.
    #[must_use]
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

/// A list query scoped by resource and optional namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceQuery {
    /// Plural resource name, e.g. `clusters`.
    pub resource: String,
    /// Namespace to list in; `None` lists across all namespaces.
    pub namespace: Option<String>,
}

impl ResourceQuery {
    /// Lists a resource across all namespaces.
    #[must_use]
    pub fn all(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            namespace: None,
        }
    }

    /// Lists a resource within one namespace.
    #[must_use]
    pub fn namespaced(resource: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Narrows the query to a namespace, if one is given.
    #[must_use]
    pub fn in_namespace(mut self, namespace: Option<&str>) -> Self {
        if let Some(ns) = namespace {
            self.namespace = Some(ns.to_string());
        }
        self
    }
}

impl fmt::Display for ResourceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} in {ns}", self.resource),
            None => write!(f, "{}", self.resource),
        }
    }
}

/// Read-only client bound to a single API group.
pub trait ResourceClient: Send + Sync {
    /// Lists resources matching the query.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Fetch`](crate::TriageError::Fetch) if the store
    /// cannot be reached or rejects the request.
    fn list<'a>(&'a self, query: &'a ResourceQuery) -> BoxFuture<'a, Result<Vec<ResourceObject>>>;
}

/// Source of API-group-scoped clients.
///
/// Implementations own transport and credentials.
pub trait ResourceStore: Send + Sync {
    /// Returns a client for the given API group.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Transport`](crate::TriageError::Transport) if the
    /// client cannot be built from the store's configuration.
    fn client_for(&self, api: &GroupVersion) -> Result<Arc<dyn ResourceClient>>;
}
