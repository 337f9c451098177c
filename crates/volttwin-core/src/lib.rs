//! Simulation core for the Volttwin battery digital twin.
//!
//! This crate owns everything between the HTTP trigger and the transport:
//! the discharge tick loop, the subscriber registry with per-connection
//! liveness, and the ingress path for out-of-band charging telemetry.
//!
//! # Architecture
//!
//! ```text
//! trigger ----> BatterySimulator --- tick ---> VehicleStateStore
//!                    |  ^                           |
//!                    |  | pre-empt            persisted record
//!                    |  |                           v
//! charging      EventIngress ---------------> SubscriberRegistry
//! telemetry                                    (fan-out to live
//!                                               subscribers)
//! ```
//!
//! Broadcasts are always emitted after the corresponding persistence call
//! completes, so subscribers never observe state newer than what is
//! durably stored.
//!
//! # Modules
//!
//! - [`config`] -- Typed YAML configuration with per-section defaults
//! - [`discharge`] -- Pure per-tick battery math (rates, rounding, clamps)
//! - [`simulator`] -- The discharge tick loop and its cancellation rules
//! - [`registry`] -- Live subscriber set and best-effort fan-out
//! - [`supervisor`] -- Per-connection liveness state machine
//! - [`ingress`] -- Inbound message vocabulary and dispatch
//! - [`store`] -- The state store seam and an in-memory implementation

pub mod config;
pub mod discharge;
pub mod ingress;
pub mod registry;
pub mod simulator;
pub mod store;
pub mod supervisor;

pub use config::{AppConfig, ConfigError, ConnectionConfig, SimulatorConfig};
pub use ingress::{EventIngress, IngressOutcome};
pub use registry::{SubscriberId, SubscriberRegistry};
pub use simulator::{BatterySimulator, SimulatorError};
pub use store::{MemoryStore, StoreError, VehicleStateStore};
pub use supervisor::{Liveness, ProbeDecision};
