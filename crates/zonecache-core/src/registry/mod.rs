//! Plugin-based provider registry
//!
//! The registry lets upstream providers and zone stores be registered by
//! name at startup, so the daemon builds them from configuration without
//! hard-coded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonecache_core::registry::ProviderRegistry;
//! use zonecache_core::config::{CacheConfig, ProviderConfig};
//!
//! let registry = ProviderRegistry::with_builtins();
//! zonecache_provider_ns1::register(&registry);
//!
//! let upstream = registry.create_provider(&provider_config)?;
//! let store = registry.create_store(&CacheConfig::Memory).await?;
//! ```
//!
//! ## Registration
//!
//! Provider crates register themselves during initialization:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("ns1", Box::new(Ns1Factory));
//! }
//! ```

use crate::config::{CacheConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::state::{FileZoneStoreFactory, MemoryZoneStoreFactory};
use crate::traits::{UpstreamFactory, UpstreamServices, ZoneStore, ZoneStoreFactory};
use crate::upstream::MemoryProviderFactory;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of upstream provider and zone store factories
///
/// ## Thread Safety
///
/// Interior mutability with RwLock: concurrent reads, exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered upstream provider factories
    providers: RwLock<HashMap<String, Box<dyn UpstreamFactory>>>,

    /// Registered zone store factories
    stores: RwLock<HashMap<String, Arc<dyn ZoneStoreFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the core crate's own factories
    ///
    /// Registers the `memory` provider and the `file` / `memory` stores.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_provider("memory", Box::new(MemoryProviderFactory));
        registry.register_store("file", Box::new(FileZoneStoreFactory));
        registry.register_store("memory", Box::new(MemoryZoneStoreFactory));
        registry
    }

    /// Register an upstream provider factory under a type name
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn UpstreamFactory>) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Register a zone store factory under a type name
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn ZoneStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create an upstream provider from configuration
    ///
    /// - `Err(Error::Config)`: If the provider type is not registered
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<UpstreamServices> {
        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// Create a zone store from configuration
    pub async fn create_store(&self, config: &CacheConfig) -> Result<Arc<dyn ZoneStore>> {
        let store_type = config.type_name();

        // Clone the factory out so the lock is not held across the await
        let factory = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(store_type)
            .cloned()
            .ok_or_else(|| Error::config(format!("Unknown cache type: {}", store_type)))?;

        factory.create(config).await
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    impl UpstreamFactory for MockProviderFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<UpstreamServices> {
            Err(Error::not_found("Mock provider not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();
        assert!(!registry.has_provider("mock"));

        registry.register_provider("mock", Box::new(MockProviderFactory));

        assert!(registry.has_provider("mock"));
        assert!(registry.list_providers().contains(&"mock".to_string()));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let registry = ProviderRegistry::new();
        let config = ProviderConfig::Ns1 {
            api_key: "key".to_string(),
            endpoint: crate::config::DEFAULT_NS1_ENDPOINT.to_string(),
            timeout_secs: 10,
        };

        assert!(matches!(
            registry.create_provider(&config),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_builtins_build_memory_stack() {
        let registry = ProviderRegistry::with_builtins();
        assert!(registry.has_store("file"));
        assert!(registry.has_store("memory"));

        let upstream = registry.create_provider(&ProviderConfig::Memory).unwrap();
        assert_eq!(upstream.zones.provider_name(), "memory");

        let store = registry.create_store(&CacheConfig::Memory).await.unwrap();
        assert!(store.list_zones().await.unwrap().is_empty());
    }
}
