//! Shared type definitions for the Volttwin battery simulator.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the persisted vehicle record, the battery mode enum, and the
//! wire message shapes exchanged with `WebSocket` subscribers.
//!
//! # Modules
//!
//! - [`vehicle`] -- The vehicle record, charger specifications, and battery mode
//! - [`messages`] -- Outbound wire messages (record pushes, heartbeats)

pub mod messages;
pub mod vehicle;

// Re-export all public types at crate root for convenience.
pub use messages::{Heartbeat, OutboundMessage};
pub use vehicle::{
    AcChargerSpec, BatteryMode, ChargingCurvePoint, DcChargerSpec, StateUpdate, VehicleRecord,
};
