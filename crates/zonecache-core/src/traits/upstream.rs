// # Upstream Gateway Traits
//
// Defines the capability surfaces of the authoritative DNS provider.
//
// ## Implementations
//
// - NS1: `zonecache-provider-ns1` crate
// - In-memory simulation: `zonecache_core::upstream::MemoryProvider`
//
// ## Usage
//
// ```rust,ignore
// use zonecache_core::traits::{Reply, ZoneService};
// use zonecache_core::Zone;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let zones = /* ZoneService implementation */;
//
//     match zones.create_zone(&Zone::named("example.com")).await? {
//         Reply::Accepted(response) => println!("created: {}", response.status),
//         Reply::Rejected(response) => println!("rejected: {}", response.status),
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{Record, Zone};

/// Raw status and body of an upstream answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    /// HTTP status code returned by the provider
    pub status: u16,
    body: Vec<u8>,
}

impl UpstreamResponse {
    /// Create a response from a status and body
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body exactly as the provider sent it
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the response and take its body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Turn a non-success response into the matching error
    pub fn into_error(self) -> crate::Error {
        crate::Error::upstream(self.status, self.body)
    }
}

/// Outcome of one upstream call that reached the provider
///
/// Success is decided by the status code alone. The body is never parsed
/// here; a 2xx whose document turns out unreadable is still an accepted
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The provider answered with a 2xx status
    Accepted(UpstreamResponse),
    /// The provider answered with a non-success status
    Rejected(UpstreamResponse),
}

impl Reply {
    /// Classify a response by its status
    pub fn from_response(response: UpstreamResponse) -> Self {
        if response.is_success() {
            Reply::Accepted(response)
        } else {
            Reply::Rejected(response)
        }
    }

    /// Status code of the underlying response
    pub fn status(&self) -> u16 {
        match self {
            Reply::Accepted(response) | Reply::Rejected(response) => response.status,
        }
    }

    /// Take the accepted response, turning a rejection into an error
    pub fn accepted(self) -> Result<UpstreamResponse, crate::Error> {
        match self {
            Reply::Accepted(response) => Ok(response),
            Reply::Rejected(response) => Err(response.into_error()),
        }
    }
}

/// Zone operations against the upstream provider
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to the provider's endpoints only
/// - ✅ Return the provider's answer, success or not, with its body untouched
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff
/// - ❌ Access the cache store (owned by `ZoneEngine`)
/// - ❌ Spawn tasks or threads
/// - ❌ Reinterpret a provider rejection: a non-success status is returned
///   as `Reply::Rejected` with the provider's own status and body
///
/// Transport failures (unreachable provider, timeout) are `Err(Error::Http)`.
/// Exactly one mutating request is sent per call.
#[async_trait]
pub trait ZoneService: Send + Sync {
    /// Create a zone; an accepted body is the zone document with the
    /// provider-assigned fields
    async fn create_zone(&self, zone: &Zone) -> Result<Reply, crate::Error>;

    /// Update a zone named by `zone.name`
    async fn update_zone(&self, zone: &Zone) -> Result<Reply, crate::Error>;

    /// Fetch the provider's current document for a zone
    async fn get_zone(&self, name: &str) -> Result<Reply, crate::Error>;

    /// Delete a zone; the raw response body is meant to be passed through
    async fn delete_zone(&self, name: &str) -> Result<Reply, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Record operations against the upstream provider
///
/// Same trust level and rules as [`ZoneService`].
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Create a record inside `record.zone`; the accepted body is not used
    async fn create_record(&self, record: &Record) -> Result<Reply, crate::Error>;
}

/// Both capability surfaces of one provider, ready to hand to the engine
#[derive(Clone)]
pub struct UpstreamServices {
    /// Zone operations
    pub zones: std::sync::Arc<dyn ZoneService>,
    /// Record operations
    pub records: std::sync::Arc<dyn RecordService>,
}

impl UpstreamServices {
    /// Use one provider value for both capabilities
    pub fn from_provider<P>(provider: std::sync::Arc<P>) -> Self
    where
        P: ZoneService + RecordService + 'static,
    {
        Self {
            zones: provider.clone(),
            records: provider,
        }
    }
}

impl std::fmt::Debug for UpstreamServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamServices")
            .field("provider", &self.zones.provider_name())
            .finish()
    }
}

/// Helper trait for constructing upstream providers from configuration
pub trait UpstreamFactory: Send + Sync {
    /// Create the provider's capability surfaces from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<UpstreamServices, crate::Error>;
}
