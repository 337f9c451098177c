//! The state store seam.
//!
//! The simulator and ingress path talk to persistence through
//! [`VehicleStateStore`] so the core stays testable without a database.
//! The production implementation lives in `volttwin-db`; [`MemoryStore`]
//! here backs tests and local development.
//!
//! "No record" is not an error: both operations return `Ok(None)` when
//! the store holds no vehicle row, and callers treat that as a logged
//! warning plus a graceful early return.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use volttwin_types::{StateUpdate, VehicleRecord};

/// Errors raised by a state store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying store could not be reached or rejected the
    /// operation. Fatal to the current simulation run, never retried.
    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Durable access to the single vehicle record.
///
/// Methods return explicitly `Send` futures so implementations can be
/// driven from spawned tasks.
pub trait VehicleStateStore: Clone + Send + Sync + 'static {
    /// Fetch the current vehicle record, or `None` if no record exists.
    fn find_current(
        &self,
    ) -> impl Future<Output = Result<Option<VehicleRecord>, StoreError>> + Send;

    /// Overwrite the mutable battery fields and return the updated
    /// record, or `None` if no record exists to update.
    fn update_current(
        &self,
        update: StateUpdate,
    ) -> impl Future<Output = Result<Option<VehicleRecord>, StoreError>> + Send;
}

/// In-memory [`VehicleStateStore`] holding at most one record.
///
/// Used by the test suites and for running the server without a
/// database. The `fail` switch makes every subsequent operation return
/// [`StoreError::Unavailable`], which is how the tests exercise the
/// persistence-failure paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    record: Arc<RwLock<Option<VehicleRecord>>>,
    fail: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create a store holding the given record.
    pub fn new(record: VehicleRecord) -> Self {
        Self {
            record: Arc::new(RwLock::new(Some(record))),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a store with no record at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Release);
    }

    /// Read the stored record without going through the trait.
    pub async fn snapshot(&self) -> Option<VehicleRecord> {
        self.record.read().await.clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable(String::from(
                "memory store switched to failing",
            )));
        }
        Ok(())
    }
}

impl VehicleStateStore for MemoryStore {
    async fn find_current(&self) -> Result<Option<VehicleRecord>, StoreError> {
        self.check_available()?;
        Ok(self.record.read().await.clone())
    }

    async fn update_current(
        &self,
        update: StateUpdate,
    ) -> Result<Option<VehicleRecord>, StoreError> {
        self.check_available()?;
        let mut guard = self.record.write().await;
        match guard.as_mut() {
            Some(record) => {
                record.state_of_charge = update.state_of_charge;
                record.battery_temperature = update.battery_temperature;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use uuid::Uuid;
    use volttwin_types::{AcChargerSpec, DcChargerSpec};

    use super::*;

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
            state_of_charge: 100.0,
            battery_temperature: 15.6,
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

    #[tokio::test]
    async fn update_then_find_round_trips() {
        let store = MemoryStore::new(sample_record());
        let update = StateUpdate {
            state_of_charge: 45.0,
            battery_temperature: 22.1,
        };

        let updated = store.update_current(update).await.unwrap().unwrap();
        assert_eq!(updated.state_of_charge, 45.0);
        assert_eq!(updated.battery_temperature, 22.1);

        let found = store.find_current().await.unwrap().unwrap();
        assert_eq!(found, updated);
    }

    #[tokio::test]
    async fn empty_store_returns_none_not_error() {
        let store = MemoryStore::empty();
        assert!(store.find_current().await.unwrap().is_none());
        let update = StateUpdate {
            state_of_charge: 45.0,
            battery_temperature: 22.1,
        };
        assert!(store.update_current(update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_store_surfaces_unavailable() {
        let store = MemoryStore::new(sample_record());
        store.set_failing(true);
        assert!(store.find_current().await.is_err());
        store.set_failing(false);
        assert!(store.find_current().await.is_ok());
    }
}
