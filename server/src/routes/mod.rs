pub mod catalog;
pub mod rankings;
pub mod state;

use axum::routing::get;
use axum::Router;
use storage::Database;

/// The read-only REST surface: current state, rankings, and meet-type/lift
/// catalog for viewer screens that prefer polling over a WebSocket. No
/// mutation lives here -- every command flows through the broker's `/ws`
/// gateway.
pub fn router() -> Router<Database> {
    Router::new()
        .route("/api/state", get(state::current_state))
        .route("/api/meets/:meet_code/rankings", get(rankings::meet_rankings))
        .route("/api/meet-types", get(catalog::list_meet_types))
        .route("/api/meet-types/:meet_type_id/lifts", get(catalog::list_lifts))
}
