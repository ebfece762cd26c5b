// # zonecache-api
//
// HTTP surface of the zonecache service.
//
// ## Routes
//
// | Method | Path                       | Engine operation          |
// |--------|----------------------------|---------------------------|
// | PUT    | /zones                     | create zone               |
// | GET    | /zones                     | list cached zones         |
// | GET    | /zones/{zone}              | cached zone document      |
// | POST   | /zones/{zone}              | update zone               |
// | DELETE | /zones/{zone}              | delete zone               |
// | PUT    | /zones/{zone}/{record}     | create record             |
//
// ## Response Rules
//
// - Zone create/update answer with the provider-assigned nameservers and
//   delegation instructions
// - Delete passes the provider's status and body through verbatim
// - Provider rejections are proxied unchanged
// - Local failures answer 500 with a plain-text message

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};
use zonecache_core::ZoneEngine;

pub use error::ApiError;
pub use handlers::{Delegation, ZoneSummary};

/// Instructions returned with the nameserver list after a zone mutation
pub const DELEGATION_INSTRUCTIONS: &str = "Set your domain's DNS servers to the hosts listed here. \
Normally you will do this in your domain registrar's portal. If this zone is a subdomain, you can \
do this by subdelegating the subdomain using NS records in the parent zone's DNS.";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    engine: Arc<ZoneEngine>,
}

impl AppState {
    pub fn new(engine: Arc<ZoneEngine>) -> Self {
        Self { engine }
    }
}

/// Build the service router around an engine
pub fn router(engine: Arc<ZoneEngine>) -> Router {
    Router::new()
        .route("/zones", put(handlers::create_zone).get(handlers::list_zones))
        .route(
            "/zones/{zone}",
            get(handlers::get_zone)
                .post(handlers::update_zone)
                .delete(handlers::delete_zone),
        )
        .route("/zones/{zone}/{record}", put(handlers::create_record))
        .with_state(AppState::new(engine))
}
