//! Core traits for the zonecache system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ZoneService`] / [`RecordService`]: Mutate and fetch state at the upstream provider
//! - [`ZoneStore`]: Durable local mirror of zone documents

pub mod upstream;
pub mod zone_store;

pub use upstream::{
    RecordService, Reply, UpstreamFactory, UpstreamResponse, UpstreamServices, ZoneService,
};
pub use zone_store::{CachedZone, ZoneStore, ZoneStoreFactory};
