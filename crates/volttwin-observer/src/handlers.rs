//! REST API endpoint handlers for the Observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/start-simulation` | Reset and (re)start the discharge run |
//! | `GET` | `/api/vehicle` | Current vehicle record |
//! | `GET` | `/api/status` | Simulator mode and subscriber count |

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;
use volttwin_core::store::VehicleStateStore;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index<S: VehicleStateStore>(State(state): State<AppState<S>>) -> impl IntoResponse {
    let mode = format!("{:?}", state.simulator.mode().await);
    let subscribers = state.registry.subscriber_count().await;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Volttwin Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Volttwin Observer</h1>
    <p class="subtitle">Battery digital twin monitoring server</p>

    <p>Status: <span class="status">RUNNING</span></p>

    <div>
        <div class="metric">
            <div class="label">Mode</div>
            <div class="value">{mode}</div>
        </div>
        <div class="metric">
            <div class="label">Subscribers</div>
            <div class="value">{subscribers}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/start-simulation">/start-simulation</a> -- Reset and start the discharge run</li>
        <li><a href="/api/vehicle">/api/vehicle</a> -- Current vehicle record</li>
        <li><a href="/api/status">/api/status</a> -- Simulator mode and subscriber count</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/vehicle</code> -- Live vehicle state stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /start-simulation -- reset and start the discharge run
// ---------------------------------------------------------------------------

/// Reset the stored record to the preset and (re)start the discharge
/// loop. Safe to call while a run is in flight; the newest start wins.
pub async fn start_simulation<S: VehicleStateStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ObserverError> {
    state.simulator.start().await?;
    info!("simulation start requested over HTTP");
    Ok(Json(serde_json::json!({
        "message": "Simulation started",
    })))
}

// ---------------------------------------------------------------------------
// GET /api/vehicle -- current vehicle record
// ---------------------------------------------------------------------------

/// Return the current vehicle record exactly as last persisted.
pub async fn get_vehicle<S: VehicleStateStore>(
    State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, ObserverError> {
    let record = state
        .store
        .find_current()
        .await?
        .ok_or_else(|| ObserverError::NotFound(String::from("vehicle record")))?;
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// GET /api/status -- simulator mode and subscriber count
// ---------------------------------------------------------------------------

/// Return the simulator's current mode and how many subscribers are
/// connected.
pub async fn get_status<S: VehicleStateStore>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let mode = state.simulator.mode().await;
    let subscribers = state.registry.subscriber_count().await;
    Json(serde_json::json!({
        "mode": mode,
        "subscribers": subscribers,
    }))
}
