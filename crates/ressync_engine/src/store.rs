//! Resource store contract and in-memory implementation.

use crate::error::SyncResult;
use async_trait::async_trait;
use parking_lot::RwLock;
use ressync_protocol::{LocalChange, Resource, ResourceKey};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// The local persistent resource store the engine synchronizes.
///
/// The engine only reads and writes resources through this contract and
/// never holds them beyond one sync pass. `upsert_all` must be atomic
/// (all resources in the call persist together or none do) and
/// idempotent by key, because a page or batch may be redelivered after a
/// crash whose prior outcome is unknown.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persists a collection of resources as one atomic unit.
    async fn upsert_all(&self, resources: &[Resource]) -> SyncResult<()>;

    /// Enumerates resources with unsynchronized local modifications, in
    /// store order.
    async fn locally_dirty(&self) -> SyncResult<Vec<LocalChange>>;

    /// Clears the dirty flag for a resource after a confirmed upload and
    /// records the server-assigned version.
    async fn mark_clean(&self, key: &ResourceKey, new_version: Option<&str>) -> SyncResult<()>;

    /// Records a resource-level failure. The dirty flag is left set.
    async fn mark_failed(&self, key: &ResourceKey, reason: &str) -> SyncResult<()>;
}

/// An in-memory resource store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryResourceStore {
    resources: RwLock<HashMap<ResourceKey, Resource>>,
    dirty: RwLock<Vec<LocalChange>>,
    failures: RwLock<HashMap<ResourceKey, String>>,
    upsert_calls: AtomicU64,
}

impl MemoryResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource without marking it dirty.
    pub fn insert(&self, resource: Resource) {
        self.resources
            .write()
            .insert(resource.key.clone(), resource);
    }

    /// Records a local modification: stores the resource and appends a
    /// dirty record carrying the previously known remote version.
    pub fn modify_locally(&self, resource: Resource, prior_version: Option<String>) {
        let change = LocalChange::new(resource.clone(), prior_version);
        self.resources
            .write()
            .insert(resource.key.clone(), resource);
        let mut dirty = self.dirty.write();
        dirty.retain(|c| c.key() != change.key());
        dirty.push(change);
    }

    /// Returns the stored resource for a key.
    pub fn get(&self, key: &ResourceKey) -> Option<Resource> {
        self.resources.read().get(key).cloned()
    }

    /// Number of stored resources.
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    /// Returns true if no resources are stored.
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Returns true if the resource is still flagged dirty.
    pub fn is_dirty(&self, key: &ResourceKey) -> bool {
        self.dirty.read().iter().any(|c| c.key() == key)
    }

    /// Returns the recorded failure reason for a key, if any.
    pub fn failure_reason(&self, key: &ResourceKey) -> Option<String> {
        self.failures.read().get(key).cloned()
    }

    /// Number of `upsert_all` calls that performed writes.
    pub fn write_count(&self) -> u64 {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn upsert_all(&self, resources: &[Resource]) -> SyncResult<()> {
        if resources.is_empty() {
            return Ok(());
        }
        let mut map = self.resources.write();
        for resource in resources {
            map.insert(resource.key.clone(), resource.clone());
        }
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn locally_dirty(&self) -> SyncResult<Vec<LocalChange>> {
        Ok(self.dirty.read().clone())
    }

    async fn mark_clean(&self, key: &ResourceKey, new_version: Option<&str>) -> SyncResult<()> {
        self.dirty.write().retain(|c| c.key() != key);
        self.failures.write().remove(key);
        if let Some(version) = new_version {
            if let Some(resource) = self.resources.write().get_mut(key) {
                resource.version = Some(version.to_string());
            }
        }
        Ok(())
    }

    async fn mark_failed(&self, key: &ResourceKey, reason: &str) -> SyncResult<()> {
        self.failures.write().insert(key.clone(), reason.to_string());
        Ok(())
    }
}
