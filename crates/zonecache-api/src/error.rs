//! Translation of engine failures into HTTP responses

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};
use zonecache_core::Error;

/// A failed request, ready to be rendered
#[derive(Debug)]
pub enum ApiError {
    /// The engine (or the payload decoder) reported a failure
    Engine(Error),

    /// The cached document asked for does not exist
    NotCached(String),

    /// The task running the operation did not complete
    Task(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Engine(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Engine(err) => write!(f, "{}", err),
            ApiError::NotCached(zone) => write!(f, "zone {} is not cached", zone),
            ApiError::Task(msg) => write!(f, "request task failed: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Provider rejections go back to the client as the provider sent them
            ApiError::Engine(Error::Upstream { status, body }) => {
                match StatusCode::from_u16(status) {
                    Ok(status) => (status, body).into_response(),
                    Err(_) => {
                        warn!("Upstream answered with invalid status {}", status);
                        (
                            StatusCode::BAD_GATEWAY,
                            format!("upstream answered with invalid status {}", status),
                        )
                            .into_response()
                    }
                }
            }
            ApiError::NotCached(_) => plain_text(StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Engine(Error::CacheDiverged { .. }) | ApiError::Task(_) => {
                error!("Request failed: {}", self);
                plain_text(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ApiError::Engine(_) => plain_text(StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        }
    }
}

fn plain_text(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n", message),
    )
        .into_response()
}
