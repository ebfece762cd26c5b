//! Shared setup for HTTP tests: a fixture-backed upstream stub, a file-backed
//! cache in a temp directory, and a helper that drives the router in-process.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use zonecache_core::error::Result;
use zonecache_core::traits::{RecordService, ZoneService, ZoneStore};
use zonecache_core::{
    EngineConfig, FileZoneStore, Record, Reply, UpstreamResponse, UpstreamServices, Zone,
    ZoneEngine,
};

pub const CREATE_200: &str = include_str!("../fixtures/create-200.json");
pub const UPDATE_200: &str = include_str!("../fixtures/update-200.json");

/// Zone id carried by the fixtures
pub const FIXTURE_ZONE_ID: &str = "52051b2c9f782d58bb4df41b";

fn fixture(body: &str) -> Result<Reply> {
    Ok(Reply::Accepted(UpstreamResponse::new(200, body)))
}

/// A fixture as a JSON value, for comparisons with the cache
pub fn fixture_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

/// Upstream stub answering from recorded provider responses
///
/// Only `newzone.com` exists; every other zone is a provider 404.
#[derive(Default)]
pub struct FixtureUpstream {
    calls: AtomicUsize,
    rejection: Mutex<Option<UpstreamResponse>>,
}

impl FixtureUpstream {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Answer the next call with `status` and `body`
    pub fn reject_next(&self, status: u16, body: &str) {
        *self.rejection.lock().unwrap() = Some(UpstreamResponse::new(status, body));
    }

    fn begin(&self, zone: &str) -> Option<UpstreamResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(rejection) = self.rejection.lock().unwrap().take() {
            return Some(rejection);
        }
        if zone != "newzone.com" {
            return Some(UpstreamResponse::new(404, r#"{"message":"zone not found"}"#));
        }
        None
    }
}

#[async_trait]
impl ZoneService for FixtureUpstream {
    async fn create_zone(&self, zone: &Zone) -> Result<Reply> {
        match self.begin(&zone.name) {
            Some(rejection) => Ok(Reply::Rejected(rejection)),
            None => fixture(CREATE_200),
        }
    }

    async fn update_zone(&self, zone: &Zone) -> Result<Reply> {
        match self.begin(&zone.name) {
            Some(rejection) => Ok(Reply::Rejected(rejection)),
            None => fixture(UPDATE_200),
        }
    }

    async fn get_zone(&self, name: &str) -> Result<Reply> {
        match self.begin(name) {
            Some(rejection) => Ok(Reply::Rejected(rejection)),
            None => fixture(CREATE_200),
        }
    }

    async fn delete_zone(&self, name: &str) -> Result<Reply> {
        match self.begin(name) {
            Some(rejection) => Ok(Reply::Rejected(rejection)),
            None => Ok(Reply::Accepted(UpstreamResponse::new(200, ""))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fixture"
    }
}

#[async_trait]
impl RecordService for FixtureUpstream {
    async fn create_record(&self, record: &Record) -> Result<Reply> {
        match self.begin(&record.zone) {
            Some(rejection) => Ok(Reply::Rejected(rejection)),
            // NS1 may confirm a record with an empty body
            None => Ok(Reply::Accepted(UpstreamResponse::new(200, ""))),
        }
    }
}

/// A router wired to an upstream and a file-backed cache
pub struct TestApp<P> {
    pub router: Router,
    pub engine: Arc<ZoneEngine>,
    pub upstream: Arc<P>,
    pub store: Arc<FileZoneStore>,
    _dir: TempDir,
}

impl<P> TestApp<P>
where
    P: ZoneService + RecordService + 'static,
{
    pub async fn new(upstream: P) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileZoneStore::new(dir.path().join("zones.json")).await.unwrap());
        let upstream = Arc::new(upstream);

        let (engine, _events) = ZoneEngine::new(
            UpstreamServices::from_provider(upstream.clone()),
            store.clone(),
            &EngineConfig::default(),
        )
        .unwrap();
        let engine = Arc::new(engine);

        Self {
            router: zonecache_api::router(engine.clone()),
            engine,
            upstream,
            store,
            _dir: dir,
        }
    }

    /// Send one request and collect the response
    pub async fn send(&self, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    /// The cached document for a zone, read straight from the store
    pub async fn cached(&self, name: &str) -> Option<Value> {
        self.store.get_zone(name).await.unwrap()
    }

    /// The cached document read through the zone model
    pub async fn cached_zone(&self, name: &str) -> Option<Zone> {
        self.store
            .get_entry(name)
            .await
            .unwrap()
            .map(|entry| entry.zone().unwrap())
    }
}
