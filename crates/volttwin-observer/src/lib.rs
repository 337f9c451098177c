//! Observer API server for the Volttwin battery simulator.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/vehicle`) streaming the full vehicle
//!   record on every persisted change, with per-connection liveness
//!   probing and application heartbeats
//! - **Simulation trigger** (`GET /start-simulation`) that resets the
//!   record and starts the discharge loop
//! - **REST endpoints** for the current record and simulator status
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The HTTP layer is generic over the state store seam, so the router
//! can be exercised in tests against the in-memory store while
//! production runs against `PostgreSQL`. Each `WebSocket` connection
//! registers with the core subscriber registry and owns its own bounded
//! queue; a slow client misses frames instead of slowing the tick loop.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
