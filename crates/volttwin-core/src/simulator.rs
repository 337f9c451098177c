//! The battery discharge simulator and its tick loop.
//!
//! [`BatterySimulator`] owns the single active tick-loop task and the
//! [`BatteryMode`] it implies. Starting a run is "last start wins": any
//! existing loop is cancelled before the stored record is reset to the
//! configured preset and a new loop is spawned. Charging telemetry
//! pre-empts the loop through [`BatterySimulator::enter_charging`].
//!
//! Each tick: discharge one step, perturb the temperature, persist, then
//! broadcast the persisted record -- in that order, so subscribers never
//! observe state newer than what is durably stored. Persistence failure
//! is fatal to the run (logged, not retried) and never to the process.
//!
//! Cancellation aborts the task at an await point; an in-flight persist
//! is a single-row update and either lands whole or not at all, so
//! aborting mid-persist cannot corrupt the record.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use volttwin_types::{BatteryMode, OutboundMessage, StateUpdate, VehicleRecord};

use crate::config::SimulatorConfig;
use crate::discharge;
use crate::registry::SubscriberRegistry;
use crate::store::{StoreError, VehicleStateStore};

/// Errors surfaced when starting a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    /// The state store failed during the reset or initial fetch.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The state store holds no vehicle record to simulate.
    #[error("no vehicle record exists in the state store")]
    NoVehicle,
}

/// Owner of the discharge state machine and the single tick-loop task.
///
/// Shared behind an [`Arc`] between the trigger handler, the event
/// ingress, and the status endpoint. All mutation of the run slot and
/// mode goes through async locks; the battery state itself lives in the
/// store and is only ever written by the loop or the ingress path,
/// never both at once (entering charging cancels the loop first).
pub struct BatterySimulator<S> {
    store: S,
    registry: Arc<SubscriberRegistry>,
    config: SimulatorConfig,
    mode: RwLock<BatteryMode>,
    run: Mutex<Option<JoinHandle<()>>>,
}

impl<S: VehicleStateStore> BatterySimulator<S> {
    /// Create an idle simulator.
    pub fn new(store: S, registry: Arc<SubscriberRegistry>, config: SimulatorConfig) -> Self {
        Self {
            store,
            registry,
            config,
            mode: RwLock::new(BatteryMode::Idle),
            run: Mutex::new(None),
        }
    }

    /// Which activity currently owns the battery state.
    pub async fn mode(&self) -> BatteryMode {
        *self.mode.read().await
    }

    /// Start a discharge run. Last start wins.
    ///
    /// Cancels any existing loop, resets the stored record to the
    /// configured preset, and spawns the recurring tick task.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Store`] if the reset fails, or
    /// [`SimulatorError::NoVehicle`] if the store holds no record (a
    /// logged warning; nothing is started).
    pub async fn start(self: &Arc<Self>) -> Result<(), SimulatorError> {
        // Hold the run slot for the entire start: overlapping starts
        // (or a concurrent charging pre-emption) serialize here, so no
        // caller can observe an empty slot while a freshly spawned loop
        // is still unaccounted for.
        let mut run = self.run.lock().await;
        Self::abort_run(&mut run);

        let preset = StateUpdate {
            state_of_charge: self.config.preset.state_of_charge,
            battery_temperature: self.config.preset.battery_temperature,
        };
        let Some(record) = self.store.update_current(preset).await? else {
            warn!("no vehicle record in the state store, simulation not started");
            return Err(SimulatorError::NoVehicle);
        };

        *self.mode.write().await = BatteryMode::Discharging;
        *run = Some(tokio::spawn(Self::run_loop(Arc::clone(self), record)));
        drop(run);

        info!(
            state_of_charge = preset.state_of_charge,
            battery_temperature = preset.battery_temperature,
            tick_interval_secs = self.config.tick_interval_secs,
            "battery discharge simulation started"
        );
        Ok(())
    }

    /// Cancel any running tick loop and return to [`BatteryMode::Idle`].
    ///
    /// Idempotent: halting an already-stopped simulator is a no-op.
    pub async fn halt(&self) {
        self.cancel_run().await;
        *self.mode.write().await = BatteryMode::Idle;
    }

    /// Cancel any running tick loop and hand the battery state to an
    /// external charging session.
    ///
    /// The loop is always cancelled before the caller writes any new
    /// state, preserving the one-writer-at-a-time invariant.
    pub async fn enter_charging(&self) {
        self.cancel_run().await;
        *self.mode.write().await = BatteryMode::Charging;
    }

    /// Abort the current tick-loop task, if any.
    async fn cancel_run(&self) {
        let mut run = self.run.lock().await;
        Self::abort_run(&mut run);
    }

    /// Take and abort whatever task occupies the run slot.
    fn abort_run(run: &mut Option<JoinHandle<()>>) {
        if let Some(task) = run.take() {
            // Aborting a task that already finished is a no-op.
            task.abort();
            debug!("discharge tick loop cancelled");
        }
    }

    /// The recurring tick task. Runs until the floor is reached, the
    /// store fails, or the task is aborted.
    async fn run_loop(simulator: Arc<Self>, record: VehicleRecord) {
        let config = &simulator.config;
        let tick_interval = Duration::from_secs(config.tick_interval_secs.max(1));
        let per_tick =
            discharge::per_tick_discharge(config.hourly_discharge_percent, tick_interval);

        let mut state_of_charge = record.state_of_charge;
        let mut temperature = record.battery_temperature;

        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; consume it so
        // the first real discharge step lands one full period in.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            state_of_charge = discharge::discharge_step(state_of_charge, per_tick);
            temperature = {
                let mut rng = rand::rng();
                discharge::perturb_temperature(
                    &mut rng,
                    temperature,
                    config.temperature_jitter,
                    config.max_temperature,
                )
            };

            let update = StateUpdate {
                state_of_charge,
                battery_temperature: temperature,
            };
            let persisted = match simulator.store.update_current(update).await {
                Ok(Some(updated)) => updated,
                Ok(None) => {
                    warn!("vehicle record disappeared mid-run, stopping simulation");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "failed to persist battery state, stopping simulation");
                    break;
                }
            };

            let delivered = simulator
                .registry
                .publish(&OutboundMessage::Vehicle(persisted))
                .await;
            debug!(
                state_of_charge,
                battery_temperature = temperature,
                delivered,
                "tick persisted and broadcast"
            );

            if state_of_charge <= discharge::SOC_FLOOR {
                info!(
                    floor = discharge::SOC_FLOOR,
                    "state of charge reached the floor, simulation stopped"
                );
                break;
            }
        }

        *simulator.mode.write().await = BatteryMode::Idle;
    }
}
