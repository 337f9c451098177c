//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use volttwin_core::store::VehicleStateStore;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /start-simulation` -- reset and start the discharge run
/// - `GET /ws/vehicle` -- `WebSocket` vehicle state stream
/// - `GET /api/vehicle` -- current vehicle record
/// - `GET /api/status` -- simulator mode and subscriber count
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router<S: VehicleStateStore>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Simulation trigger
        .route("/start-simulation", get(handlers::start_simulation))
        // WebSocket
        .route("/ws/vehicle", get(ws::ws_vehicle))
        // REST API
        .route("/api/vehicle", get(handlers::get_vehicle))
        .route("/api/status", get(handlers::get_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
