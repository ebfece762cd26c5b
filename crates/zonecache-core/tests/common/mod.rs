//! Test doubles and common utilities for reconciliation contract tests
//!
//! The doubles share a [`Journal`] so tests can assert the relative order of
//! upstream calls and cache writes.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use zonecache_core::error::{Error, Result};
use zonecache_core::traits::{
    CachedZone, RecordService, Reply, UpstreamResponse, UpstreamServices, ZoneService,
    ZoneStore,
};
use zonecache_core::{
    EngineConfig, MemoryProvider, MemoryZoneStore, Record, SyncEvent, Zone, ZoneEngine,
};

/// Ordered log of upstream calls and cache mutations
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries starting with `upstream:`
    pub fn upstream_calls(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with("upstream:"))
            .collect()
    }

    /// Entries starting with `store:` that changed the cache
    pub fn store_writes(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with("store:put") || e.starts_with("store:delete"))
            .collect()
    }
}

/// A MemoryProvider that journals each call and can simulate transport failure
pub struct JournaledUpstream {
    pub provider: MemoryProvider,
    journal: Journal,
    unreachable: AtomicBool,
    rejected_gets: Mutex<Option<u16>>,
}

impl JournaledUpstream {
    pub fn new(journal: Journal) -> Self {
        Self {
            provider: MemoryProvider::new(),
            journal,
            unreachable: AtomicBool::new(false),
            rejected_gets: Mutex::new(None),
        }
    }

    /// Answer every following `get_zone` with `status`
    pub fn reject_gets(&self, status: u16) {
        *self.rejected_gets.lock().unwrap() = Some(status);
    }

    /// Make every following call fail at the transport level
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn enter(&self, call: &str) -> Result<()> {
        self.journal.push(format!("upstream:{call}"));
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::http("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl ZoneService for JournaledUpstream {
    async fn create_zone(&self, zone: &Zone) -> Result<Reply> {
        self.enter(&format!("create_zone {}", zone.name))?;
        self.provider.create_zone(zone).await
    }

    async fn update_zone(&self, zone: &Zone) -> Result<Reply> {
        self.enter(&format!("update_zone {}", zone.name))?;
        self.provider.update_zone(zone).await
    }

    async fn get_zone(&self, name: &str) -> Result<Reply> {
        self.enter(&format!("get_zone {name}"))?;
        if let Some(status) = *self.rejected_gets.lock().unwrap() {
            return Ok(Reply::Rejected(UpstreamResponse::new(status, "unavailable")));
        }
        self.provider.get_zone(name).await
    }

    async fn delete_zone(&self, name: &str) -> Result<Reply> {
        self.enter(&format!("delete_zone {name}"))?;
        self.provider.delete_zone(name).await
    }

    fn provider_name(&self) -> &'static str {
        "journaled"
    }
}

#[async_trait]
impl RecordService for JournaledUpstream {
    async fn create_record(&self, record: &Record) -> Result<Reply> {
        self.enter(&format!("create_record {}", record.key()))?;
        self.provider.create_record(record).await
    }
}

/// A MemoryZoneStore that journals mutations and can be made to fail writes
pub struct JournaledStore {
    pub inner: MemoryZoneStore,
    journal: Journal,
    fail_writes: AtomicBool,
}

impl JournaledStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            inner: MemoryZoneStore::new(),
            journal,
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store("disk full"));
        }
        Ok(())
    }
}

#[async_trait]
impl ZoneStore for JournaledStore {
    async fn put_zone(&self, name: &str, document: &Value) -> Result<()> {
        self.journal.push(format!("store:put {name}"));
        self.check_writable()?;
        self.inner.put_zone(name, document).await
    }

    async fn get_entry(&self, name: &str) -> Result<Option<CachedZone>> {
        self.journal.push(format!("store:get {name}"));
        self.inner.get_entry(name).await
    }

    async fn delete_zone(&self, name: &str) -> Result<()> {
        self.journal.push(format!("store:delete {name}"));
        self.check_writable()?;
        self.inner.delete_zone(name).await
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        self.inner.list_zones().await
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Engine plus handles on its collaborators
pub struct Harness {
    pub engine: ZoneEngine,
    pub events: mpsc::Receiver<SyncEvent>,
    pub upstream: Arc<JournaledUpstream>,
    pub store: Arc<JournaledStore>,
    pub journal: Journal,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::new();
        let upstream = Arc::new(JournaledUpstream::new(journal.clone()));
        let store = Arc::new(JournaledStore::new(journal.clone()));

        let (engine, events) = ZoneEngine::new(
            UpstreamServices::from_provider(upstream.clone()),
            store.clone(),
            &EngineConfig::default(),
        )
        .expect("engine construction succeeds");

        Self {
            engine,
            events,
            upstream,
            store,
            journal,
        }
    }

    /// Cached document, exactly as stored
    pub async fn cached_document(&self, name: &str) -> Option<Value> {
        self.store.inner.get_zone(name).await.unwrap()
    }

    /// Cached document read through the zone model
    pub async fn cached_zone(&self, name: &str) -> Option<Zone> {
        self.store
            .inner
            .get_entry(name)
            .await
            .unwrap()
            .map(|entry| entry.zone().unwrap())
    }

    /// Cache entry serialized to JSON, for byte-level comparisons
    pub async fn cache_snapshot(&self, name: &str) -> Option<String> {
        self.store
            .inner
            .get_entry(name)
            .await
            .unwrap()
            .map(|entry| serde_json::to_string(&entry).unwrap())
    }

    /// All events emitted so far
    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
