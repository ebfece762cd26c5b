// # Memory Zone Store
//
// In-memory implementation of ZoneStore.
//
// ## Purpose
//
// A fast zone cache that doesn't persist across restarts. Useful for tests
// and deployments where re-populating the cache from the provider after a
// restart is acceptable.
//
// ## Crash Behavior
//
// - All cached zones are lost on restart/crash
// - The provider remains authoritative; nothing is lost upstream

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use serde_json::Value;

use crate::Error;
use crate::traits::zone_store::{CachedZone, ZoneStore, ZoneStoreFactory};

/// In-memory zone store implementation
///
/// All entries live in a HashMap protected by a RwLock. Clones share the
/// same map.
///
/// # Example
///
/// ```rust,no_run
/// use serde_json::json;
/// use zonecache_core::state::MemoryZoneStore;
/// use zonecache_core::traits::ZoneStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryZoneStore::new();
///
///     store.put_zone("example.com", &json!({"zone": "example.com"})).await?;
///     assert!(store.get_zone("example.com").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryZoneStore {
    inner: Arc<RwLock<HashMap<String, CachedZone>>>,
}

impl MemoryZoneStore {
    /// Create a new empty memory zone store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of cached zones
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryZoneStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ZoneStore for MemoryZoneStore {
    async fn put_zone(&self, name: &str, document: &Value) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::store("Refusing to cache a zone without a name"));
        }
        let mut guard = self.inner.write().await;
        guard.insert(name.to_string(), CachedZone::new(document.clone()));
        Ok(())
    }

    async fn get_entry(&self, name: &str) -> Result<Option<CachedZone>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(name).cloned())
    }

    async fn delete_zone(&self, name: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(name);
        Ok(())
    }

    async fn list_zones(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

/// Factory for in-memory zone stores
pub struct MemoryZoneStoreFactory;

#[async_trait]
impl ZoneStoreFactory for MemoryZoneStoreFactory {
    async fn create(
        &self,
        config: &crate::config::CacheConfig,
    ) -> Result<Arc<dyn ZoneStore>, Error> {
        match config {
            crate::config::CacheConfig::Memory => Ok(Arc::new(MemoryZoneStore::new())),
            _ => Err(Error::config("Invalid config for memory zone store")),
        }
    }
}
