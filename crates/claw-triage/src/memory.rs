//! In-process resource store.
//!
//! [`MemoryStore`] serves seeded objects without a cluster. It can also
//! inject transport and fetch failures, add per-query latency, and record
//! every query it receives. Dry runs and tests use it to drive analyzers.

use crate::error::{Result, TriageError};
use crate::store::{BoxFuture, GroupVersion, ResourceClient, ResourceQuery, ResourceStore};
use crate::types::ResourceObject;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

type ResourceKey = (String, String);

#[derive(Debug, Default)]
struct Inner {
    objects: RwLock<HashMap<ResourceKey, Vec<ResourceObject>>>,
    rejected_groups: RwLock<HashMap<String, String>>,
    failing: RwLock<HashMap<String, String>>,
    latency: RwLock<Option<Duration>>,
    queries: Mutex<Vec<(String, ResourceQuery)>>,
}

fn resource_key(api: &GroupVersion, resource: &str) -> ResourceKey {
    (api.to_string(), resource.to_ascii_lowercase())
}

/// A [`ResourceStore`] backed by in-memory object lists.
///
/// Resource names are matched case-insensitively. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object under the given API group and resource.
    #[must_use]
    pub fn with_object(self, api: &GroupVersion, resource: &str, object: ResourceObject) -> Self {
        self.insert(api, resource, object);
        self
    }

    /// Adds an object under the given API group and resource.
    pub fn insert(&self, api: &GroupVersion, resource: &str, object: ResourceObject) {
        self.inner
            .objects
            .write()
            .entry(resource_key(api, resource))
            .or_default()
            .push(object);
    }

    /// Makes [`ResourceStore::client_for`] fail for an API group.
    pub fn reject_group(&self, api: &GroupVersion, reason: impl Into<String>) {
        self.inner
            .rejected_groups
            .write()
            .insert(api.to_string(), reason.into());
    }

    /// Makes every list of `resource` fail with a fetch error.
    pub fn fail_resource(&self, resource: &str, reason: impl Into<String>) {
        self.inner
            .failing
            .write()
            .insert(resource.to_ascii_lowercase(), reason.into());
    }

    /// Delays every list by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.write() = Some(latency);
    }

    /// Returns every query received so far, with the API group it targeted.
    #[must_use]
    pub fn queries(&self) -> Vec<(String, ResourceQuery)> {
        self.inner.queries.lock().clone()
    }

    /// Returns how many times `resource` has been listed.
    #[must_use]
    pub fn query_count(&self, resource: &str) -> usize {
        self.inner
            .queries
            .lock()
            .iter()
            .filter(|(_, q)| q.resource.eq_ignore_ascii_case(resource))
            .count()
    }
}

impl ResourceStore for MemoryStore {
    fn client_for(&self, api: &GroupVersion) -> Result<Arc<dyn ResourceClient>> {
        if let Some(reason) = self.inner.rejected_groups.read().get(&api.to_string()) {
            return Err(TriageError::Transport {
                group_version: api.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(Arc::new(MemoryClient {
            api: api.clone(),
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct MemoryClient {
    api: GroupVersion,
    inner: Arc<Inner>,
}

impl MemoryClient {
    fn answer(&self, query: &ResourceQuery) -> Result<Vec<ResourceObject>> {
        if let Some(reason) = self
            .inner
            .failing
            .read()
            .get(&query.resource.to_ascii_lowercase())
        {
            return Err(TriageError::Fetch {
                resource: query.resource.clone(),
                reason: reason.clone(),
            });
        }

        let objects = self.inner.objects.read();
        let items = objects
            .get(&resource_key(&self.api, &query.resource))
            .map(|items| {
                items
                    .iter()
                    .filter(|o| {
                        query
                            .namespace
                            .as_deref()
                            .is_none_or(|ns| o.namespace() == ns)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }
}

impl ResourceClient for MemoryClient {
    fn list<'a>(&'a self, query: &'a ResourceQuery) -> BoxFuture<'a, Result<Vec<ResourceObject>>> {
        Box::pin(async move {
            self.inner
                .queries
                .lock()
                .push((self.api.to_string(), query.clone()));

            let latency = *self.inner.latency.read();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            self.answer(query)
        })
    }
}
