//! The vehicle record and its battery state.
//!
//! [`VehicleRecord`] mirrors the single persisted row in the state store and
//! is also the full payload pushed to `WebSocket` subscribers. Field names
//! serialize in camelCase to match the wire format the dashboard consumes
//! (`stateOfCharge`, `batteryTemperature`, ...).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which activity currently owns the battery state.
///
/// Exactly one mode holds at any instant. A transition into
/// [`BatteryMode::Charging`] always cancels an in-flight discharge loop
/// before any new state is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryMode {
    /// No simulation running; the stored record is at rest.
    Idle,
    /// The discharge tick loop is mutating state.
    Discharging,
    /// External charging telemetry is driving state.
    Charging,
}

/// A point on a DC fast-charging curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingCurvePoint {
    /// State of charge at which this point applies, in percent.
    pub percentage: f64,
    /// Charging power at that state of charge, in kW.
    pub power: f64,
}

/// AC (onboard) charger specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcChargerSpec {
    /// Number of usable phases on the onboard charger.
    pub usable_phases: u8,
    /// Supported connector port names (e.g. `type2`).
    pub ports: Vec<String>,
    /// Maximum AC charging power in kW.
    pub max_power: f64,
}

/// DC (fast) charger specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcChargerSpec {
    /// Supported connector port names (e.g. `ccs`).
    pub ports: Vec<String>,
    /// Maximum DC charging power in kW.
    pub max_power: f64,
    /// Power delivered at increasing states of charge.
    pub charging_curve: Vec<ChargingCurvePoint>,
}

/// The persisted vehicle record: static attributes plus the mutable
/// battery state the simulator drives.
///
/// Exactly one record exists per process; it is created by the database
/// seed migration and mutated in place for the lifetime of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    /// Stable record identifier.
    pub id: Uuid,
    /// Manufacturer name.
    pub brand: String,
    /// Model name.
    pub model: String,
    /// Body style (e.g. `sedan`, `suv`).
    pub vehicle_type: String,
    /// Usable battery capacity in kWh.
    pub battery_size: f64,
    /// Nominal charging voltage in volts.
    pub charging_voltage: f64,
    /// Rated energy consumption in kWh per 100 km.
    pub energy_consumption: f64,
    /// Configured discharge rate in percent per hour.
    pub discharge_rate: f64,
    /// Battery fill level in percent.
    pub state_of_charge: f64,
    /// Battery pack temperature in degrees Celsius.
    pub battery_temperature: f64,
    /// AC charger specification.
    pub ac_charger: AcChargerSpec,
    /// DC charger specification.
    pub dc_charger: DcChargerSpec,
}

/// The mutable fields written back to the store each tick or on a
/// charging event. Everything else on the record is static.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    /// New battery fill level in percent.
    pub state_of_charge: f64,
    /// New battery pack temperature in degrees Celsius.
    pub battery_temperature: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A representative record for serialization tests.
    fn sample_record() -> VehicleRecord {
        VehicleRecord {
            id: Uuid::nil(),
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
                charging_curve: vec![
                    ChargingCurvePoint {
                        percentage: 20.0,
                        power: 150.0,
                    },
                    ChargingCurvePoint {
                        percentage: 80.0,
                        power: 60.0,
                    },
                ],
            },
        }
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert!(json.get("stateOfCharge").is_some());
        assert!(json.get("batteryTemperature").is_some());
        assert!(json.get("vehicleType").is_some());
        assert!(json.get("acCharger").is_some());
        // No snake_case leakage on the wire.
        assert!(json.get("state_of_charge").is_none());
    }

    #[test]
    fn record_round_trips() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: VehicleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn battery_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&BatteryMode::Discharging).unwrap(),
            "\"discharging\""
        );
        assert_eq!(
            serde_json::to_string(&BatteryMode::Idle).unwrap(),
            "\"idle\""
        );
    }
}
