//! Engine binary for the Volttwin battery simulator.
//!
//! This is the main entry point that wires together the state store,
//! the discharge simulator, the subscriber registry, and the Observer
//! HTTP + `WebSocket` server, then waits for shutdown.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `volttwin-config.yaml`
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Assemble the registry, simulator, and event ingress
//! 5. Start the Observer API server
//! 6. Wait for Ctrl-C, then halt the simulator and close the pool

mod error;

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use volttwin_core::config::AppConfig;
use volttwin_core::ingress::EventIngress;
use volttwin_core::registry::SubscriberRegistry;
use volttwin_core::simulator::BatterySimulator;
use volttwin_db::{PostgresPool, VehicleStore};
use volttwin_observer::server::ServerConfig;
use volttwin_observer::state::AppState;

use crate::error::EngineError;

/// Application entry point for the engine.
///
/// Initializes all subsystems and runs until terminated.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("volttwin-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        host = config.server.host,
        port = config.server.port,
        tick_interval_secs = config.simulator.tick_interval_secs,
        hourly_discharge_percent = config.simulator.hourly_discharge_percent,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and run migrations.
    let pool = PostgresPool::connect(&config.infrastructure.postgres_url)
        .await
        .map_err(EngineError::from)?;
    pool.run_migrations().await.map_err(EngineError::from)?;
    let store = VehicleStore::new(&pool);
    info!("State store ready");

    // 4. Assemble the core: registry, simulator, ingress.
    let registry = Arc::new(SubscriberRegistry::new());
    let simulator = Arc::new(BatterySimulator::new(
        store.clone(),
        Arc::clone(&registry),
        config.simulator.clone(),
    ));
    let ingress = Arc::new(EventIngress::new(
        Arc::clone(&simulator),
        store.clone(),
        Arc::clone(&registry),
        config.simulator.max_temperature,
    ));
    let app_state = AppState::new(
        store,
        registry,
        Arc::clone(&simulator),
        ingress,
        config.connections.clone(),
    );

    // 5. Start the Observer API server.
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let observer_handle =
        volttwin_observer::spawn_observer(server_config, app_state).map_err(EngineError::from)?;
    info!(port = config.server.port, "Observer API server started");

    // 6. Wait for shutdown.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    simulator.halt().await;
    observer_handle.abort();
    pool.close().await;

    info!("volttwin-engine shutdown complete");
    Ok(())
}

/// Load the application configuration from `volttwin-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<AppConfig, EngineError> {
    let config_path = Path::new("volttwin-config.yaml");
    if config_path.exists() {
        let config = AppConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        // Parsing an empty document still applies environment overrides.
        Ok(AppConfig::parse("{}")?)
    }
}
