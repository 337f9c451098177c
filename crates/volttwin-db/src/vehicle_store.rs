//! Vehicle table operations.
//!
//! The `vehicle` table holds exactly one row, seeded by the initial
//! migration. The simulator and the charging ingress both funnel their
//! writes through [`VehicleStore::update_current`], so the row is
//! always the last committed battery reading.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;
use volttwin_core::store::{StoreError, VehicleStateStore};
use volttwin_types::{AcChargerSpec, DcChargerSpec, StateUpdate, VehicleRecord};

use crate::error::DbError;
use crate::postgres::PostgresPool;

/// Database row for a vehicle.
#[derive(Debug, sqlx::FromRow)]
pub struct VehicleRow {
    /// Unique identifier.
    pub id: Uuid,
    /// Manufacturer name.
    pub brand: String,
    /// Model name.
    pub model: String,
    /// Body style classification.
    pub vehicle_type: String,
    /// Usable battery capacity in kWh.
    pub battery_size: f64,
    /// Nominal charging voltage.
    pub charging_voltage: f64,
    /// Average consumption in kWh per 100 km.
    pub energy_consumption: f64,
    /// Simulated discharge rate in percent per hour.
    pub discharge_rate: f64,
    /// Current state of charge in percent.
    pub state_of_charge: f64,
    /// Current battery temperature in degrees Celsius.
    pub battery_temperature: f64,
    /// AC charging capability (JSONB).
    pub ac_charger: Json<AcChargerSpec>,
    /// DC charging capability (JSONB).
    pub dc_charger: Json<DcChargerSpec>,
}

impl From<VehicleRow> for VehicleRecord {
    fn from(row: VehicleRow) -> Self {
        Self {
            id: row.id,
            brand: row.brand,
            model: row.model,
            vehicle_type: row.vehicle_type,
            battery_size: row.battery_size,
            charging_voltage: row.charging_voltage,
            energy_consumption: row.energy_consumption,
            discharge_rate: row.discharge_rate,
            state_of_charge: row.state_of_charge,
            battery_temperature: row.battery_temperature,
            ac_charger: row.ac_charger.0,
            dc_charger: row.dc_charger.0,
        }
    }
}

/// Store for the single vehicle record backed by `PostgreSQL`.
#[derive(Clone)]
pub struct VehicleStore {
    pool: PgPool,
}

impl VehicleStore {
    /// Create a store from a connection pool handle.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    /// Fetch the current vehicle record, or `None` if the table was
    /// never seeded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn fetch_current(&self) -> Result<Option<VehicleRecord>, DbError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r"
            SELECT id, brand, model, vehicle_type, battery_size,
                   charging_voltage, energy_consumption, discharge_rate,
                   state_of_charge, battery_temperature,
                   ac_charger, dc_charger
            FROM vehicle
            ORDER BY id
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VehicleRecord::from))
    }

    /// Overwrite the mutable battery fields of the current record and
    /// return the stored result.
    ///
    /// Returns `None` if there is no record to update.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn write_current(
        &self,
        update: StateUpdate,
    ) -> Result<Option<VehicleRecord>, DbError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r"
            UPDATE vehicle
            SET state_of_charge = $1,
                battery_temperature = $2,
                updated_at = NOW()
            WHERE id = (SELECT id FROM vehicle ORDER BY id LIMIT 1)
            RETURNING id, brand, model, vehicle_type, battery_size,
                      charging_voltage, energy_consumption, discharge_rate,
                      state_of_charge, battery_temperature,
                      ac_charger, dc_charger
            ",
        )
        .bind(update.state_of_charge)
        .bind(update.battery_temperature)
        .fetch_optional(&self.pool)
        .await?;

        tracing::debug!(
            state_of_charge = update.state_of_charge,
            battery_temperature = update.battery_temperature,
            found = row.is_some(),
            "Vehicle state written"
        );

        Ok(row.map(VehicleRecord::from))
    }
}

impl VehicleStateStore for VehicleStore {
    async fn find_current(&self) -> Result<Option<VehicleRecord>, StoreError> {
        self.fetch_current()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn update_current(
        &self,
        update: StateUpdate,
    ) -> Result<Option<VehicleRecord>, StoreError> {
        self.write_current(update)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
