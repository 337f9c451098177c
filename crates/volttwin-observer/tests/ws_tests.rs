//! Integration tests for the `WebSocket` connection lifecycle.
//!
//! Unlike the router tests, these start a real server on an ephemeral
//! port and drive it with a `tokio-tungstenite` client, because the
//! liveness path under test spans the transport: a client that stops
//! reading also stops answering protocol pings, which is exactly the
//! half-open condition the per-connection supervision must detect.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::StreamExt;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;
use volttwin_core::config::{ConnectionConfig, SimulatorConfig};
use volttwin_core::ingress::EventIngress;
use volttwin_core::registry::SubscriberRegistry;
use volttwin_core::simulator::BatterySimulator;
use volttwin_core::store::MemoryStore;
use volttwin_observer::router::build_router;
use volttwin_observer::state::AppState;
use volttwin_types::{AcChargerSpec, DcChargerSpec, Heartbeat, OutboundMessage, VehicleRecord};

fn sample_record() -> VehicleRecord {
    VehicleRecord {
        id: Uuid::new_v4(),
        brand: String::from("Volttwin"),
        model: String::from("DT-1"),
        vehicle_type: String::from("sedan"),
        battery_size: 75.0,
        charging_voltage: 400.0,
        energy_consumption: 16.2,
        discharge_rate: 10.0,
        state_of_charge: 83.2,
        battery_temperature: 18.4,
        ac_charger: AcChargerSpec {
            usable_phases: 3,
            ports: vec![String::from("type2")],
            max_power: 11.0,
        },
        dc_charger: DcChargerSpec {
            ports: vec![String::from("ccs")],
            max_power: 150.0,
            charging_curve: Vec::new(),
        },
    }
}

fn make_state(connections: ConnectionConfig) -> (Router, Arc<SubscriberRegistry>) {
    let store = MemoryStore::new(sample_record());
    let config = SimulatorConfig::default();
    let registry = Arc::new(SubscriberRegistry::new());
    let simulator = Arc::new(BatterySimulator::new(
        store.clone(),
        Arc::clone(&registry),
        config.clone(),
    ));
    let ingress = Arc::new(EventIngress::new(
        Arc::clone(&simulator),
        store.clone(),
        Arc::clone(&registry),
        config.max_temperature,
    ));
    let state = AppState::new(
        store,
        Arc::clone(&registry),
        simulator,
        ingress,
        connections,
    );
    (build_router(state), registry)
}

/// Bind an ephemeral port, serve the router in the background, and
/// return the `WebSocket` URL clients should dial.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("ws://{addr}/ws/vehicle")
}

/// Poll the registry until it reports the expected subscriber count.
async fn wait_for_count(registry: &SubscriberRegistry, expected: usize) {
    for _ in 0..50_u32 {
        if registry.subscriber_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("registry never reached {expected} subscribers");
}

#[tokio::test]
async fn silent_subscriber_is_detected_and_removed() {
    let (router, registry) = make_state(ConnectionConfig {
        probe_interval_secs: 1,
        heartbeat_interval_secs: 600,
    });
    let url = serve(router).await;

    let (mut socket, _response) = connect_async(&url).await.unwrap();
    wait_for_count(&registry, 1).await;

    // The initial snapshot arrives on connect.
    let first = socket.next().await.unwrap().unwrap();
    match first {
        Message::Text(text) => {
            let json: Value = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(json["brand"], "Volttwin");
        }
        other => panic!("expected the snapshot frame, got {other:?}"),
    }

    // Stop reading entirely. The client library only answers protocol
    // pings while its socket is being driven, so from the server's
    // point of view this connection has gone half-open: the first
    // probe's ping is never acknowledged and the second probe tick
    // must tear the connection down.
    wait_for_count(&registry, 0).await;

    // The slot is fully released: fan-out no longer counts it.
    let delivered = registry
        .publish(&OutboundMessage::Heartbeat(Heartbeat::now()))
        .await;
    assert_eq!(delivered, 0);
    drop(socket);
}

#[tokio::test]
async fn responsive_subscriber_outlives_probes_and_sees_heartbeats() {
    let (router, registry) = make_state(ConnectionConfig {
        probe_interval_secs: 1,
        heartbeat_interval_secs: 1,
    });
    let url = serve(router).await;

    let (mut socket, _response) = connect_async(&url).await.unwrap();

    // Keep reading: pings are answered as a side effect, so several
    // probe intervals elapse without the connection expiring, and the
    // application heartbeats keep flowing on their own timer.
    let mut heartbeats = 0_u32;
    for _ in 0..20_u32 {
        let frame = tokio::time::timeout(Duration::from_secs(3), socket.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = frame {
            let json: Value = serde_json::from_str(text.as_str()).unwrap();
            if json["type"] == "heartbeat" {
                heartbeats = heartbeats.saturating_add(1);
            }
        }
        if heartbeats >= 3 {
            break;
        }
    }
    assert!(heartbeats >= 3, "expected heartbeats to keep arriving");
    assert_eq!(registry.subscriber_count().await, 1);
}
