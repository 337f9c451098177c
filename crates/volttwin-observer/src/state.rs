//! Shared application state for the Observer API server.
//!
//! [`AppState`] is generic over the state store so the HTTP layer can be
//! exercised in tests against the in-memory store while production runs
//! against `PostgreSQL`. Everything inside is cheaply cloneable; Axum
//! clones the state per request.

use std::sync::Arc;

use volttwin_core::config::ConnectionConfig;
use volttwin_core::ingress::EventIngress;
use volttwin_core::registry::SubscriberRegistry;
use volttwin_core::simulator::BatterySimulator;
use volttwin_core::store::VehicleStateStore;

/// Shared state for the Axum application.
///
/// Injected via Axum's `State` extractor. The registry is the single
/// source of truth for who is connected; the simulator and ingress both
/// publish through it.
pub struct AppState<S> {
    /// Durable access to the vehicle record.
    pub store: S,
    /// The live subscriber set.
    pub registry: Arc<SubscriberRegistry>,
    /// The discharge simulator.
    pub simulator: Arc<BatterySimulator<S>>,
    /// Dispatcher for messages subscribers push back.
    pub ingress: Arc<EventIngress<S>>,
    /// Probe and heartbeat cadence for each connection.
    pub connections: ConnectionConfig,
}

impl<S: VehicleStateStore> AppState<S> {
    /// Assemble the application state from its already-wired parts.
    pub const fn new(
        store: S,
        registry: Arc<SubscriberRegistry>,
        simulator: Arc<BatterySimulator<S>>,
        ingress: Arc<EventIngress<S>>,
        connections: ConnectionConfig,
    ) -> Self {
        Self {
            store,
            registry,
            simulator,
            ingress,
            connections,
        }
    }
}

impl<S: Clone> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: Arc::clone(&self.registry),
            simulator: Arc::clone(&self.simulator),
            ingress: Arc::clone(&self.ingress),
            connections: self.connections.clone(),
        }
    }
}
