// # Memory Provider
//
// In-process simulation of an authoritative DNS provider.
//
// ## Purpose
//
// Stands in for the real provider in tests and local development. It
// behaves like NS1 where the cache cares about it:
// - assigns a 24-hex-digit zone id on create
// - fills in default TTL and SOA timers the client did not send
// - assigns four nameservers
// - folds created records into the zone document's `records`
//
// Canned answers can be queued with `answer_next` to exercise error paths.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Error;
use crate::config::ProviderConfig;
use crate::model::{Record, Zone, ZoneRecord};
use crate::traits::upstream::{
    RecordService, Reply, UpstreamFactory, UpstreamResponse, UpstreamServices, ZoneService,
};

/// Nameservers handed to every zone
pub const DEFAULT_NAMESERVERS: [&str; 4] = [
    "dns1.p06.nsone.net",
    "dns2.p06.nsone.net",
    "dns3.p06.nsone.net",
    "dns4.p06.nsone.net",
];

/// Default zone TTL
pub const DEFAULT_TTL: u32 = 3600;

/// In-memory provider
#[derive(Debug, Default)]
pub struct MemoryProvider {
    zones: Mutex<HashMap<String, Zone>>,
    scripted: Mutex<VecDeque<UpstreamResponse>>,
    next_id: AtomicU64,
    calls: AtomicUsize,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call answer with `status` and `body` instead of running
    ///
    /// A scripted 2xx is accepted without touching the provider's zones.
    pub fn answer_next(&self, status: u16, body: impl Into<Vec<u8>>) {
        lock(&self.scripted).push_back(UpstreamResponse::new(status, body));
    }

    /// Number of calls received so far, rejected ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The provider's current document for a zone
    pub fn zone(&self, name: &str) -> Option<Zone> {
        lock(&self.zones).get(name).cloned()
    }

    fn begin_call(&self) -> Option<UpstreamResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.scripted).pop_front()
    }

    fn assign_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{:024x}", n)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn rejection(status: u16, text: &str) -> Reply {
    Reply::Rejected(UpstreamResponse::new(
        status,
        serde_json::json!({ "message": text }).to_string(),
    ))
}

fn accept<T: serde::Serialize>(document: &T) -> Result<Reply, Error> {
    let body = serde_json::to_vec(document)?;
    Ok(Reply::Accepted(UpstreamResponse::new(200, body)))
}

#[async_trait]
impl ZoneService for MemoryProvider {
    async fn create_zone(&self, zone: &Zone) -> Result<Reply, Error> {
        if let Some(scripted) = self.begin_call() {
            return Ok(Reply::from_response(scripted));
        }
        if zone.name.is_empty() {
            return Ok(rejection(400, "zone name is required"));
        }

        let mut zones = lock(&self.zones);
        if zones.contains_key(&zone.name) {
            return Ok(rejection(400, "zone already exists"));
        }

        let mut created = zone.clone();
        created.id = self.assign_id();
        created.ttl.get_or_insert(DEFAULT_TTL);
        created.nx_ttl.get_or_insert(DEFAULT_TTL);
        created.refresh.get_or_insert(43200);
        created.retry.get_or_insert(7200);
        created.expiry.get_or_insert(1_209_600);
        created.dns_servers = DEFAULT_NAMESERVERS.iter().map(|s| s.to_string()).collect();
        created.records.clear();

        zones.insert(created.name.clone(), created.clone());
        drop(zones);

        accept(&created)
    }

    async fn update_zone(&self, zone: &Zone) -> Result<Reply, Error> {
        if let Some(scripted) = self.begin_call() {
            return Ok(Reply::from_response(scripted));
        }

        let mut zones = lock(&self.zones);
        let Some(current) = zones.get_mut(&zone.name) else {
            return Ok(rejection(404, "zone not found"));
        };

        // Server-assigned fields (id, dns_servers, records) are not client-editable
        if zone.ttl.is_some() {
            current.ttl = zone.ttl;
        }
        if zone.nx_ttl.is_some() {
            current.nx_ttl = zone.nx_ttl;
        }
        if zone.retry.is_some() {
            current.retry = zone.retry;
        }
        if zone.refresh.is_some() {
            current.refresh = zone.refresh;
        }
        if zone.expiry.is_some() {
            current.expiry = zone.expiry;
        }
        if !zone.networks.is_empty() {
            current.networks = zone.networks.clone();
        }
        for (key, value) in &zone.extra {
            current.extra.insert(key.clone(), value.clone());
        }

        let updated = current.clone();
        drop(zones);

        accept(&updated)
    }

    async fn get_zone(&self, name: &str) -> Result<Reply, Error> {
        if let Some(scripted) = self.begin_call() {
            return Ok(Reply::from_response(scripted));
        }
        match self.zone(name) {
            Some(zone) => accept(&zone),
            None => Ok(rejection(404, "zone not found")),
        }
    }

    async fn delete_zone(&self, name: &str) -> Result<Reply, Error> {
        if let Some(scripted) = self.begin_call() {
            return Ok(Reply::from_response(scripted));
        }
        if lock(&self.zones).remove(name).is_none() {
            return Ok(rejection(404, "zone not found"));
        }
        Ok(Reply::Accepted(UpstreamResponse::new(200, b"{}".to_vec())))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl RecordService for MemoryProvider {
    async fn create_record(&self, record: &Record) -> Result<Reply, Error> {
        if let Some(scripted) = self.begin_call() {
            return Ok(Reply::from_response(scripted));
        }

        let mut zones = lock(&self.zones);
        let Some(zone) = zones.get_mut(&record.zone) else {
            return Ok(rejection(404, "zone not found"));
        };
        if zone.record(&record.key()).is_some() {
            return Ok(rejection(400, "record already exists"));
        }

        let mut created = record.clone();
        created.id = self.assign_id();
        zone.records.push(ZoneRecord {
            id: created.id.clone(),
            domain: created.domain.clone(),
            record_type: created.record_type.clone(),
            short_answers: created.answers.iter().map(|a| a.short_form()).collect(),
            ttl: created.ttl.or(zone.ttl),
            extra: Default::default(),
        });
        drop(zones);

        accept(&created)
    }
}

/// Factory for the in-memory provider
pub struct MemoryProviderFactory;

impl UpstreamFactory for MemoryProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<UpstreamServices, Error> {
        match config {
            ProviderConfig::Memory => {
                tracing::warn!("Using the in-memory provider - zones exist only in this process");
                Ok(UpstreamServices::from_provider(Arc::new(MemoryProvider::new())))
            }
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}
