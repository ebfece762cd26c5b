//! Error types for the zonecache system
//!
//! This module defines all error types used throughout the crate.
//!
//! The variants fall into four families:
//! - **Decode / validation** (`Decode`, `InvalidInput`, `ZoneMismatch`):
//!   raised before any upstream call is attempted
//! - **Upstream** (`Upstream`, `Http`, `Provider`): the provider rejected the
//!   call or could not be reached
//! - **Cache** (`Store`, `CacheDiverged`): the local mirror could not be read
//!   or written
//! - **Ambient** (`Config`, `Json`, `Io`, `NotFound`, `Other`)

use thiserror::Error;

/// Result type alias for zonecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the zonecache system
#[derive(Error, Debug)]
pub enum Error {
    /// Inbound payload could not be decoded
    #[error("{0}")]
    Decode(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The zone named in the request body differs from the one in the path
    #[error("Zone name doesn't match record: path names {path}, body names {body}")]
    ZoneMismatch {
        /// Zone name taken from the request path
        path: String,
        /// Zone name found in the request body
        body: String,
    },

    /// The upstream provider answered with a non-success status
    ///
    /// Status and body are the provider's own, untouched.
    #[error("Upstream rejected the request with status {status}")]
    Upstream {
        /// HTTP status code returned by the provider
        status: u16,
        /// Raw response body returned by the provider
        body: Vec<u8>,
    },

    /// HTTP transport errors (provider unreachable, timeout, ...)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Cache store-related errors
    #[error("Cache store error: {0}")]
    Store(String),

    /// The upstream mutation succeeded but the cache could not be brought in line
    #[error("Zone {zone} changed upstream but the cache could not be updated: {reason}")]
    CacheDiverged {
        /// Zone whose cached copy is now stale
        zone: String,
        /// Underlying failure
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a zone name mismatch error
    pub fn zone_mismatch(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::ZoneMismatch {
            path: path.into(),
            body: body.into(),
        }
    }

    /// Create an upstream rejection error
    pub fn upstream(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a cache store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a cache divergence error
    pub fn cache_diverged(zone: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::CacheDiverged {
            zone: zone.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether the error was raised before the upstream was contacted
    pub fn is_local_rejection(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::InvalidInput(_) | Self::ZoneMismatch { .. }
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
