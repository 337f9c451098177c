//! `WebSocket` handler for real-time vehicle state streaming.
//!
//! Clients connect to `GET /ws/vehicle`, immediately receive the current
//! stored record, and from then on receive a JSON-encoded record every
//! time the simulator or the charging ingress persists a change.
//!
//! Each connection task drives its own liveness probing: a protocol Ping
//! goes out every probe interval and a connection that misses a whole
//! interval without a Pong is torn down. Application heartbeats are sent
//! on their own timer so dashboards can show link health.

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use std::time::Duration;
use tracing::{debug, warn};
use volttwin_core::store::VehicleStateStore;
use volttwin_core::supervisor::ProbeDecision;
use volttwin_types::Heartbeat;

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming vehicle state.
///
/// # Route
///
/// `GET /ws/vehicle`
pub async fn ws_vehicle<S: VehicleStateStore>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: register with the subscriber
/// registry, push the initial snapshot, then forward broadcasts until
/// the connection closes or its liveness probe expires.
async fn handle_ws<S: VehicleStateStore>(mut socket: WebSocket, state: AppState<S>) {
    let (id, mut rx) = state.registry.register().await;
    debug!(subscriber = %id, "WebSocket client connected");

    // Initial snapshot: best effort. A store hiccup here only costs the
    // client its catch-up frame; the broadcast stream still follows.
    match state.store.find_current().await {
        Ok(Some(record)) => match serde_json::to_string(&record) {
            Ok(json) => {
                if socket.send(Message::Text(json.into())).await.is_err() {
                    state.registry.remove(id).await;
                    return;
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize initial snapshot"),
        },
        Ok(None) => debug!("no vehicle record for initial snapshot"),
        Err(e) => warn!(error = %e, "failed to load initial snapshot"),
    }

    let probe_period = Duration::from_secs(state.connections.probe_interval_secs.max(1));
    let heartbeat_period = Duration::from_secs(state.connections.heartbeat_interval_secs.max(1));
    let mut probe = tokio::time::interval(probe_period);
    let mut heartbeat = tokio::time::interval(heartbeat_period);
    // Both timers fire immediately on creation; consume those so the
    // first probe and heartbeat land one full period in.
    probe.tick().await;
    heartbeat.tick().await;

    loop {
        tokio::select! {
            // A broadcast from the simulator or the charging ingress.
            message = rx.recv() => {
                let Some(message) = message else {
                    debug!(subscriber = %id, "outbound queue closed");
                    break;
                };
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize broadcast");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(subscriber = %id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            // Liveness probe timer.
            _ = probe.tick() => {
                match state.registry.begin_probe(id).await {
                    Some(ProbeDecision::SendPing) => {
                        if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                            debug!(subscriber = %id, "WebSocket client disconnected (ping failed)");
                            break;
                        }
                    }
                    Some(ProbeDecision::Expired) => {
                        debug!(subscriber = %id, "liveness probe expired, closing connection");
                        break;
                    }
                    None => break,
                }
            }
            // Application heartbeat timer.
            _ = heartbeat.tick() => {
                let json = match serde_json::to_string(&Heartbeat::now()) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize heartbeat");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(subscriber = %id, "WebSocket client disconnected (heartbeat failed)");
                    break;
                }
            }
            // Anything the client sends back.
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(subscriber = %id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        state.registry.acknowledge(id).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(subscriber = %id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        state.ingress.handle_text(text.as_str()).await;
                    }
                    Some(Err(e)) => {
                        debug!(subscriber = %id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // Ignore binary frames.
                    }
                }
            }
        }
    }

    state.registry.remove(id).await;
    debug!(subscriber = %id, "subscriber connection closed");
}
