// # zonecache-core
//
// Core library for the zonecache service: a local, durable mirror of DNS
// zones managed at an upstream provider.
//
// ## Architecture Overview
//
// - **ZoneService / RecordService**: Traits for the upstream provider's zone and record APIs
// - **ZoneStore**: Trait for the durable zone cache (one namespace, keyed by zone name)
// - **ZoneEngine**: Reconciliation engine sequencing upstream calls and cache writes
// - **ProviderRegistry**: Plugin-based registry for providers and stores
//
// ## Design Principles
//
// 1. **Upstream is authoritative**: The cache only ever holds documents the provider returned
// 2. **Upstream first**: No cache write happens before the provider confirmed the mutation
// 3. **Nothing masked**: Provider rejections pass through with their own status and body
// 4. **No hidden retries**: One upstream call per operation; divergence is reported, not repaired
// 5. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod registry;
pub mod state;
pub mod traits;
pub mod upstream;

// Re-export core types for convenience
pub use config::{CacheConfig, EngineConfig, ProviderConfig, ServiceConfig};
pub use engine::{Operation, SyncEvent, ZoneEngine};
pub use error::{Error, Result};
pub use model::{Answer, Record, RecordKey, Zone, ZoneRecord};
pub use registry::ProviderRegistry;
pub use state::{FileZoneStore, MemoryZoneStore};
pub use traits::{
    CachedZone, RecordService, Reply, UpstreamResponse, UpstreamServices, ZoneService, ZoneStore,
};
pub use upstream::MemoryProvider;
