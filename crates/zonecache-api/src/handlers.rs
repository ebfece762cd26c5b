//! Route handlers
//!
//! Each mutating handler decodes its payload up front, so malformed input
//! never reaches the provider, then runs the engine operation on its own
//! task. A client that disconnects mid-request therefore does not cancel an
//! in-flight upstream call or the cache write that follows it.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use zonecache_core::{Error, Record, Zone, ZoneEngine};

use crate::{AppState, ApiError, DELEGATION_INSTRUCTIONS};

/// Body returned after a successful zone create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delegation {
    /// Nameservers the provider assigned to the zone
    pub dns_servers: Vec<String>,
    /// How to delegate the domain to those nameservers
    pub message: String,
}

impl From<Zone> for Delegation {
    fn from(zone: Zone) -> Self {
        Self {
            dns_servers: zone.dns_servers,
            message: DELEGATION_INSTRUCTIONS.to_string(),
        }
    }
}

/// One entry of the cached zone listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub zone: String,
    pub synced_at: DateTime<Utc>,
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::from(Error::decode(e.to_string())))
}

/// Run an engine operation to completion regardless of the client
async fn detached<T, F, Fut>(engine: &Arc<ZoneEngine>, operation: F) -> Result<T, ApiError>
where
    F: FnOnce(Arc<ZoneEngine>) -> Fut,
    Fut: Future<Output = zonecache_core::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(operation(Arc::clone(engine)))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}

pub(crate) async fn create_zone(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Delegation>, ApiError> {
    let input: Zone = decode(&body)?;

    let zone = detached(&state.engine, |engine| async move {
        engine.create_zone(input).await
    })
    .await?;

    Ok(Json(Delegation::from(zone)))
}

pub(crate) async fn update_zone(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Delegation>, ApiError> {
    let input: Zone = decode(&body)?;

    let zone = detached(&state.engine, |engine| async move {
        engine.update_zone(&name, input).await
    })
    .await?;

    Ok(Json(Delegation::from(zone)))
}

pub(crate) async fn delete_zone(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let response = detached(&state.engine, |engine| async move {
        engine.delete_zone(&name).await
    })
    .await?;

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.into_body(),
    )
        .into_response())
}

pub(crate) async fn create_record(
    State(state): State<AppState>,
    Path((zone, domain)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let mut record: Record = decode(&body)?;

    // The path names the record; the body may omit those fields but not contradict them
    if record.zone.is_empty() {
        record.zone = zone;
    } else if record.zone != zone {
        return Err(Error::zone_mismatch(zone, record.zone).into());
    }
    if record.domain.is_empty() {
        record.domain = domain;
    } else if record.domain != domain {
        return Err(Error::invalid_input(format!(
            "record domain {} doesn't match path {}",
            record.domain, domain
        ))
        .into());
    }

    detached(&state.engine, |engine| async move {
        engine.create_record(record).await
    })
    .await?;

    Ok(StatusCode::OK)
}

pub(crate) async fn list_zones(
    State(state): State<AppState>,
) -> Result<Json<Vec<ZoneSummary>>, ApiError> {
    let entries = state.engine.cached_zones().await?;
    debug!("Listing {} cached zones", entries.len());

    Ok(Json(
        entries
            .into_iter()
            .map(|(zone, entry)| ZoneSummary {
                zone,
                synced_at: entry.synced_at,
            })
            .collect(),
    ))
}

/// Serve the cached document as the provider returned it
pub(crate) async fn get_zone(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.engine.cached_zone(&name).await? {
        Some(entry) => Ok(Json(entry.document)),
        None => Err(ApiError::NotCached(name)),
    }
}
