//! Zone reconciliation engine
//!
//! The ZoneEngine is responsible for:
//! - Forwarding each mutation to the upstream provider
//! - Mirroring the provider's authoritative answer into the ZoneStore
//! - Reporting rejections and cache divergence without masking them
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────┐
//!   request ────────▶ │  ZoneEngine  │
//!                     └──────────────┘
//!                            │
//!         ┌──────────────────┼──────────────────┐
//!         │ 1                │ 2                │ 3
//!         ▼                  ▼                  ▼
//! ┌───────────────┐  ┌──────────────┐   ┌─────────────┐
//! │ ZoneService / │  │  ZoneStore   │   │   Events    │
//! │ RecordService │  │  (mirror)    │   │  (notify)   │
//! └───────────────┘  └──────────────┘   └─────────────┘
//! ```
//!
//! ## Two-phase protocol
//!
//! 1. Exactly one mutating call goes to the provider
//! 2. Only if the provider confirmed it, the cache is overwritten with the
//!    provider's returned document (never the client's input), stored value
//!    for value under the name the client asked for
//!
//! A provider rejection leaves the cache untouched and is returned as
//! [`Error::Upstream`] with the provider's own status and body. A cache
//! failure after a confirmed mutation is returned as
//! [`Error::CacheDiverged`]; the upstream change is not undone. A 2xx whose
//! body is not a readable zone document for the requested name counts as
//! such a failure.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::model::{Record, Zone};
use crate::traits::{
    CachedZone, RecordService, Reply, UpstreamResponse, UpstreamServices, ZoneService, ZoneStore,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, trace, warn};

/// Engine operations, one per client-facing intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateZone,
    UpdateZone,
    DeleteZone,
    SyncZone,
    CreateRecord,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::CreateZone => "create zone",
            Operation::UpdateZone => "update zone",
            Operation::DeleteZone => "delete zone",
            Operation::SyncZone => "sync zone",
            Operation::CreateRecord => "create record",
        };
        f.write_str(name)
    }
}

/// Events emitted by the ZoneEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Zone created upstream and cached
    ZoneCreated { zone: String, id: String },

    /// Zone updated upstream and cache overwritten
    ZoneUpdated { zone: String },

    /// Zone deleted upstream and removed from the cache
    ZoneDeleted { zone: String },

    /// Zone re-fetched from upstream and cache overwritten
    ZoneSynced { zone: String, records: usize },

    /// Record created upstream
    RecordCreated { zone: String, record: String },

    /// Provider answered with a non-success status; cache untouched
    UpstreamRejected {
        operation: Operation,
        zone: String,
        status: u16,
    },

    /// Provider confirmed the mutation but the cache is now stale
    CacheDiverged {
        operation: Operation,
        zone: String,
        reason: String,
    },
}

/// Zone reconciliation engine
///
/// Each operation is a strict two-phase sequence: one upstream call, then
/// (on success only) one cache write. The engine is stateless between
/// requests and is shared behind an `Arc` by all handlers.
///
/// ## Concurrency
///
/// Requests for the same zone are not serialized; the last cache write wins.
/// The store guarantees per-key atomicity.
pub struct ZoneEngine {
    /// Upstream zone operations
    zones: Arc<dyn ZoneService>,

    /// Upstream record operations
    records: Arc<dyn RecordService>,

    /// Local mirror of zone documents
    store: Arc<dyn ZoneStore>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl ZoneEngine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        upstream: UpstreamServices,
        store: Arc<dyn ZoneStore>,
        config: &EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            zones: upstream.zones,
            records: upstream.records,
            store,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Name of the upstream provider
    pub fn provider_name(&self) -> &'static str {
        self.zones.provider_name()
    }

    /// Create a zone upstream and cache the provider's document
    ///
    /// The returned document carries the provider-assigned id, TTL defaults
    /// and nameservers.
    pub async fn create_zone(&self, input: Zone) -> Result<Zone> {
        if input.name.is_empty() {
            return Err(Error::invalid_input("zone name is required"));
        }
        let name = input.name.clone();

        let reply = self
            .zones
            .create_zone(&input)
            .await
            .inspect_err(|e| warn!("Upstream {} failed for {}: {}", Operation::CreateZone, name, e))?;
        let response = self.confirmed(Operation::CreateZone, &name, reply)?;

        let zone = self.persist(Operation::CreateZone, &name, &response).await?;

        info!("Created zone {} (id: {})", zone.name, zone.id);
        self.emit_event(SyncEvent::ZoneCreated {
            zone: zone.name.clone(),
            id: zone.id.clone(),
        });
        Ok(zone)
    }

    /// Update a zone upstream and overwrite its cache entry
    ///
    /// `name` (from the request path) is authoritative. If `input` names a
    /// different zone the call fails before anything is sent upstream.
    pub async fn update_zone(&self, name: &str, mut input: Zone) -> Result<Zone> {
        if name.is_empty() {
            return Err(Error::invalid_input("zone name is required"));
        }
        if !input.name.is_empty() && input.name != name {
            warn!(
                "Refusing to update {}: request body names {}",
                name, input.name
            );
            return Err(Error::zone_mismatch(name, input.name));
        }
        input.name = name.to_string();

        let reply = self
            .zones
            .update_zone(&input)
            .await
            .inspect_err(|e| warn!("Upstream {} failed for {}: {}", Operation::UpdateZone, name, e))?;
        let response = self.confirmed(Operation::UpdateZone, name, reply)?;

        let zone = self.persist(Operation::UpdateZone, name, &response).await?;

        info!("Updated zone {}", zone.name);
        self.emit_event(SyncEvent::ZoneUpdated {
            zone: zone.name.clone(),
        });
        Ok(zone)
    }

    /// Delete a zone upstream and drop its cache entry
    ///
    /// Returns the provider's raw response so its body can be passed through.
    pub async fn delete_zone(&self, name: &str) -> Result<UpstreamResponse> {
        if name.is_empty() {
            return Err(Error::invalid_input("zone name is required"));
        }

        let reply = self
            .zones
            .delete_zone(name)
            .await
            .inspect_err(|e| warn!("Upstream {} failed for {}: {}", Operation::DeleteZone, name, e))?;
        let response = self.confirmed(Operation::DeleteZone, name, reply)?;

        if let Err(e) = self.store.delete_zone(name).await {
            return Err(self.diverged(Operation::DeleteZone, name, e));
        }

        info!("Deleted zone {}", name);
        self.emit_event(SyncEvent::ZoneDeleted {
            zone: name.to_string(),
        });
        Ok(response)
    }

    /// Re-fetch a zone from upstream and overwrite its cache entry
    ///
    /// Always a full refresh: the fetched document replaces the cached one.
    pub async fn sync_zone(&self, name: &str) -> Result<Zone> {
        let reply = self
            .zones
            .get_zone(name)
            .await
            .inspect_err(|e| warn!("Upstream {} failed for {}: {}", Operation::SyncZone, name, e))?;
        let response = self.confirmed(Operation::SyncZone, name, reply)?;

        let zone = self.persist(Operation::SyncZone, name, &response).await?;

        debug!("Synced zone {} ({} records)", zone.name, zone.records.len());
        self.emit_event(SyncEvent::ZoneSynced {
            zone: zone.name.clone(),
            records: zone.records.len(),
        });
        Ok(zone)
    }

    /// Create a record upstream, then re-sync its owning zone
    ///
    /// Any 2xx counts as created, whatever its body. If the record was
    /// created but the zone could not be re-synced, the cached zone is stale
    /// and [`Error::CacheDiverged`] is returned.
    pub async fn create_record(&self, record: Record) -> Result<()> {
        if record.zone.is_empty() {
            return Err(Error::invalid_input("record zone is required"));
        }
        if record.domain.is_empty() {
            return Err(Error::invalid_input("record domain is required"));
        }
        if record.record_type.is_empty() {
            return Err(Error::invalid_input("record type is required"));
        }
        let zone_name = record.zone.clone();
        let key = record.key();

        let reply = self
            .records
            .create_record(&record)
            .await
            .inspect_err(|e| {
                warn!("Upstream {} failed for {}: {}", Operation::CreateRecord, key, e)
            })?;
        self.confirmed(Operation::CreateRecord, &zone_name, reply)?;

        info!("Created record {} in zone {}", key, zone_name);
        self.emit_event(SyncEvent::RecordCreated {
            zone: zone_name.clone(),
            record: key.to_string(),
        });

        match self.sync_zone(&zone_name).await {
            Ok(_) => Ok(()),
            Err(e @ Error::CacheDiverged { .. }) => Err(e),
            Err(e) => Err(self.diverged(Operation::CreateRecord, &zone_name, e)),
        }
    }

    /// Cached entry for a zone; never contacts the provider
    pub async fn cached_zone(&self, name: &str) -> Result<Option<CachedZone>> {
        self.store.get_entry(name).await
    }

    /// All cached entries with their names, sorted by name; never contacts
    /// the provider
    pub async fn cached_zones(&self) -> Result<Vec<(String, CachedZone)>> {
        let mut entries = Vec::new();
        for name in self.store.list_zones().await? {
            // Deleted between list and get
            if let Some(entry) = self.store.get_entry(&name).await? {
                entries.push((name, entry));
            }
        }
        Ok(entries)
    }

    /// Persist any pending cache changes
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    /// Phase-1 gate: pass an accepted reply through, report a rejection
    fn confirmed(
        &self,
        operation: Operation,
        zone: &str,
        reply: Reply,
    ) -> Result<UpstreamResponse> {
        match reply {
            Reply::Accepted(response) => Ok(response),
            Reply::Rejected(response) => {
                warn!(
                    "Upstream rejected {} for {} with status {}",
                    operation, zone, response.status
                );
                self.emit_event(SyncEvent::UpstreamRejected {
                    operation,
                    zone: zone.to_string(),
                    status: response.status,
                });
                Err(response.into_error())
            }
        }
    }

    /// Phase 2: overwrite the cache entry with the provider's document
    ///
    /// Runs after the provider confirmed the mutation, so every failure here
    /// is divergence.
    async fn persist(
        &self,
        operation: Operation,
        name: &str,
        response: &UpstreamResponse,
    ) -> Result<Zone> {
        let (zone, document) = match read_document(name, response.body()) {
            Ok(parts) => parts,
            Err(e) => return Err(self.diverged(operation, name, e)),
        };

        self.store
            .put_zone(name, &document)
            .await
            .map_err(|e| self.diverged(operation, name, e))?;
        Ok(zone)
    }

    fn diverged(&self, operation: Operation, zone: &str, cause: Error) -> Error {
        error!(
            "{} for {} took effect upstream but the cache was not updated: {}",
            operation, zone, cause
        );
        self.emit_event(SyncEvent::CacheDiverged {
            operation,
            zone: zone.to_string(),
            reason: cause.to_string(),
        });
        Error::cache_diverged(zone, cause)
    }

    /// Emit a sync event without ever blocking the request
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                trace!("Event receiver dropped, discarding event");
            }
        }
    }
}

/// Parse a confirmed zone body, keeping the raw document next to the typed one
///
/// The document must name the zone it is about to be cached under.
fn read_document(name: &str, body: &[u8]) -> Result<(Zone, Value)> {
    let document: Value = serde_json::from_slice(body)
        .map_err(|e| Error::decode(format!("unreadable provider document: {}", e)))?;
    let zone: Zone = serde_json::from_value(document.clone())
        .map_err(|e| Error::decode(format!("provider document is not a zone: {}", e)))?;

    if zone.name != name {
        return Err(Error::invalid_input(format!(
            "provider document names zone '{}' instead of '{}'",
            zone.name, name
        )));
    }
    Ok((zone, document))
}
