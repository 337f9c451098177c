//! Outbound wire messages pushed to `WebSocket` subscribers.
//!
//! Subscribers receive exactly two shapes: the full [`VehicleRecord`] as a
//! bare JSON object (no envelope, matching what the dashboard binds to),
//! and a lightweight [`Heartbeat`] that keeps the transport warm between
//! state updates. [`OutboundMessage`] serializes untagged so each variant
//! appears on the wire in its natural form.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::vehicle::VehicleRecord;

/// Discriminator value carried in the heartbeat `type` field.
const HEARTBEAT_TYPE: &str = "heartbeat";

/// A keepalive payload pushed on a fixed interval.
///
/// Heartbeats are application-level messages, distinct from the
/// transport-level ping/pong liveness probes: they exist only so
/// intermediaries see periodic traffic, and play no part in liveness
/// determination.
#[derive(Debug, Clone, Serialize)]
pub struct Heartbeat {
    /// Always `"heartbeat"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Send time in RFC 3339 / ISO 8601 form.
    pub timestamp: DateTime<Utc>,
}

impl Heartbeat {
    /// Create a heartbeat stamped with the current wall-clock time.
    pub fn now() -> Self {
        Self {
            kind: HEARTBEAT_TYPE,
            timestamp: Utc::now(),
        }
    }
}

/// A message bound for a subscriber's outbound queue.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// A full vehicle record, pushed after every persisted state change.
    Vehicle(VehicleRecord),
    /// A transport keepalive payload.
    Heartbeat(Heartbeat),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_carries_type_and_timestamp() {
        let json = serde_json::to_value(Heartbeat::now()).unwrap();
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("heartbeat"));
        // RFC 3339 timestamps parse back through chrono.
        let raw = json.get("timestamp").and_then(|v| v.as_str()).unwrap();
        assert!(raw.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn outbound_heartbeat_serializes_untagged() {
        let msg = OutboundMessage::Heartbeat(Heartbeat::now());
        let json = serde_json::to_value(&msg).unwrap();
        // No enum envelope: the heartbeat fields sit at the top level.
        assert_eq!(json.get("type").and_then(|v| v.as_str()), Some("heartbeat"));
    }
}
