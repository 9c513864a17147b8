//! Realtime WebSocket broker (C6): the judge/director/viewer gateway that
//! fans `engine` state out over per-meet channels and feeds director/judge
//! commands back into the attempt state machine and vote tally.

pub mod error;
pub mod hub;
pub mod meet_lookup;
pub mod protocol;
pub mod publisher;
pub mod session;
pub mod token;
pub mod ws;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub use error::{BrokerError, Result};
pub use hub::Hub;
pub use meet_lookup::MeetLookup;
pub use publisher::BrokerPublisher;
pub use ws::AppState;

/// Builds the gateway's axum router. `cors_origin` of `None` keeps CORS
/// wide open (`AllowOrigin::any()`); supplying one restricts it to that
/// single origin.
pub fn router(state: Arc<AppState>, cors_origin: Option<String>) -> Router {
    let origin = match cors_origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(value) => AllowOrigin::exact(value),
        None => AllowOrigin::any(),
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(state)
}
