//! Configuration types for the zonecache system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Default address the HTTP surface listens on
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default location of the zone cache file
pub const DEFAULT_CACHE_PATH: &str = "./zones.json";

/// Default NS1 API endpoint
pub const DEFAULT_NS1_ENDPOINT: &str = "https://api.nsone.net/v1";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address of the HTTP listener
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Upstream provider configuration
    pub provider: ProviderConfig,

    /// Zone cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ServiceConfig {
    /// Create a configuration with defaults for the given provider
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            listen_addr: default_listen_addr(),
            provider,
            cache: CacheConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.cache.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Upstream provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// NS1 managed DNS
    Ns1 {
        /// NS1 API key
        api_key: String,
        /// API base URL
        #[serde(default = "default_ns1_endpoint")]
        endpoint: String,
        /// Per-request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// In-process simulation of a provider (local development)
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Ns1 {
                api_key,
                endpoint,
                timeout_secs,
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("NS1 API key cannot be empty"));
                }
                if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "NS1 endpoint must be an HTTP(S) URL, got: {}",
                        endpoint
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("NS1 request timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Ns1 { .. } => "ns1",
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Zone cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheConfig {
    /// File-backed cache
    File {
        /// Path to the cache file
        path: String,
    },

    /// In-memory cache (not persistent)
    Memory,
}

impl CacheConfig {
    /// Validate the cache configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CacheConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Cache file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the cache type name
    pub fn type_name(&self) -> &'static str {
        match self {
            CacheConfig::File { .. } => "file",
            CacheConfig::Memory => "memory",
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig::File {
            path: DEFAULT_CACHE_PATH.to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Capacity of the sync event channel
    ///
    /// When full, new events are dropped (with a warning log). Requests are
    /// never held up by a slow event consumer.
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_ns1_endpoint() -> String {
    DEFAULT_NS1_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    1000
}
