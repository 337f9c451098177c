//! Inbound message vocabulary and dispatch.
//!
//! Subscribers can push JSON objects of the shape `{"type": ..., ...}`
//! back over their connection. The vocabulary is small and closed:
//! charging telemetry pre-empts the discharge loop; everything else is
//! tolerated and logged. No inbound message is ever fatal to the
//! connection or the process -- malformed payloads are logged and
//! dropped.
//!
//! `charging_complete` carries no state on purpose: the charging
//! controller persists its final reading through `charging_update`, so
//! the completion marker is purely informational.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};
use volttwin_types::{OutboundMessage, StateUpdate};

use crate::discharge;
use crate::registry::SubscriberRegistry;
use crate::simulator::BatterySimulator;
use crate::store::VehicleStateStore;

/// What an inbound message amounted to. Returned for observability and
/// tests; the connection always survives regardless of the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngressOutcome {
    /// Charging telemetry was persisted and broadcast.
    Applied,
    /// The discharge loop was pre-empted without a state write.
    Halted,
    /// The message required no action (heartbeat, unknown or missing
    /// type, informational marker).
    NoOp,
    /// The payload could not be parsed.
    Malformed,
    /// The store rejected the write or held no record.
    Failed,
}

/// Dispatcher for out-of-band events arriving on subscriber connections.
pub struct EventIngress<S> {
    simulator: Arc<BatterySimulator<S>>,
    store: S,
    registry: Arc<SubscriberRegistry>,
    max_temperature: f64,
}

/// Typed fields of a `charging_update` message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargingUpdatePayload {
    battery_percentage: f64,
    battery_temperature: f64,
}

impl<S: VehicleStateStore> EventIngress<S> {
    /// Create an ingress dispatcher.
    ///
    /// `max_temperature` bounds externally supplied temperatures the
    /// same way the simulator bounds its own.
    pub const fn new(
        simulator: Arc<BatterySimulator<S>>,
        store: S,
        registry: Arc<SubscriberRegistry>,
        max_temperature: f64,
    ) -> Self {
        Self {
            simulator,
            store,
            registry,
            max_temperature,
        }
    }

    /// Handle one inbound text frame.
    pub async fn handle_text(&self, raw: &str) -> IngressOutcome {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "malformed subscriber message, dropping");
                return IngressOutcome::Malformed;
            }
        };

        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            debug!("subscriber message without a type field, ignoring");
            return IngressOutcome::NoOp;
        };

        match kind {
            "charging_update" => self.apply_charging_update(value).await,
            "charging_init" => {
                self.simulator.enter_charging().await;
                info!("charging session initiated, discharge loop pre-empted");
                IngressOutcome::Halted
            }
            "charging_complete" => {
                // Informational only; the final state arrives as a
                // charging_update from the same controller.
                debug!("charging session complete");
                IngressOutcome::NoOp
            }
            "heartbeat" => {
                debug!("subscriber heartbeat echo");
                IngressOutcome::NoOp
            }
            other => {
                debug!(message_type = other, "ignoring unknown message type");
                IngressOutcome::NoOp
            }
        }
    }

    /// Cancel the discharge loop, persist the supplied reading, and
    /// broadcast the stored result.
    async fn apply_charging_update(&self, value: Value) -> IngressOutcome {
        let payload: ChargingUpdatePayload = match serde_json::from_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "malformed charging_update payload, dropping");
                return IngressOutcome::Malformed;
            }
        };

        // Pre-empt the simulator before writing anything.
        self.simulator.enter_charging().await;

        let update = StateUpdate {
            state_of_charge: discharge::clamp_charge(payload.battery_percentage),
            battery_temperature: discharge::clamp_temperature(
                payload.battery_temperature,
                self.max_temperature,
            ),
        };
        match self.store.update_current(update).await {
            Ok(Some(record)) => {
                let delivered = self
                    .registry
                    .publish(&OutboundMessage::Vehicle(record))
                    .await;
                info!(
                    state_of_charge = update.state_of_charge,
                    battery_temperature = update.battery_temperature,
                    delivered,
                    "charging telemetry applied"
                );
                IngressOutcome::Applied
            }
            Ok(None) => {
                warn!("no vehicle record to apply charging telemetry to");
                IngressOutcome::Failed
            }
            Err(e) => {
                error!(error = %e, "failed to persist charging telemetry");
                IngressOutcome::Failed
            }
        }
    }
}
