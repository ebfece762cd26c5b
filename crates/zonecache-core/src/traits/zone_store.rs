// # Zone Store Trait
//
// Defines the interface of the local zone cache.
//
// ## Purpose
//
// The zone store is a durable mirror of the provider's zone documents,
// keyed by zone name. It lets reads skip the round trip to the provider.
//
// It holds exactly one namespace ("zones"). There is no record-level
// storage: records are only observed inside their owning zone's document.
//
// ## Implementations
//
// - File-based: JSON file with atomic replace (`FileZoneStore`)
// - In-memory: `MemoryZoneStore`
//
// ## Usage
//
// ```rust,ignore
// use serde_json::json;
// use zonecache_core::ZoneStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* ZoneStore implementation */;
//
//     store.put_zone("example.com", &json!({"zone": "example.com"})).await?;
//     let document = store.get_zone("example.com").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde_json::Value;

use crate::model::Zone;

/// A cached zone document and when it was written
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CachedZone {
    /// The provider's document, value for value as it was returned
    pub document: Value,
    /// Timestamp of the cache write
    pub synced_at: chrono::DateTime<chrono::Utc>,
}

impl CachedZone {
    /// Wrap a provider document, stamping it with the current time
    ///
    /// `pub(crate)` so entries are only minted by store implementations.
    pub(crate) fn new(document: Value) -> Self {
        Self {
            document,
            synced_at: chrono::Utc::now(),
        }
    }

    /// Read the document through the typed zone model
    pub fn zone(&self) -> Result<Zone, crate::Error> {
        serde_json::from_value(self.document.clone())
            .map_err(|e| crate::Error::store(format!("Cached document is not a zone: {}", e)))
    }
}

/// Trait for zone store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks. A
/// reader must never observe a partially written document for a key.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Implement locking for per-key atomicity
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed writes
/// - ❌ Contact the upstream provider
/// - ❌ Decide when the cache should change (owned by `ZoneEngine`)
/// - ❌ Alter the document it is given: reads return it value for value
///
/// Every I/O or serialization failure is returned to the caller as
/// `Error::Store`.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Insert or overwrite the entry for `name`
    async fn put_zone(&self, name: &str, document: &Value) -> Result<(), crate::Error>;

    /// Get the cached zone document
    ///
    /// - `Ok(Some(Value))`: The cached document
    /// - `Ok(None)`: No entry for that name
    async fn get_zone(&self, name: &str) -> Result<Option<Value>, crate::Error> {
        Ok(self.get_entry(name).await?.map(|entry| entry.document))
    }

    /// Get the full cache entry, including its sync timestamp
    async fn get_entry(&self, name: &str) -> Result<Option<CachedZone>, crate::Error>;

    /// Remove the entry; removing an absent entry is not an error
    async fn delete_zone(&self, name: &str) -> Result<(), crate::Error>;

    /// List all cached zone names
    async fn list_zones(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing zone stores from configuration
///
/// Async because opening a durable store performs I/O.
#[async_trait]
pub trait ZoneStoreFactory: Send + Sync {
    /// Create a ZoneStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::CacheConfig,
    ) -> Result<std::sync::Arc<dyn ZoneStore>, crate::Error>;
}
