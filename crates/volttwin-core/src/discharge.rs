//! Pure per-tick battery math.
//!
//! Everything here is a free function over plain floats so the tick
//! arithmetic can be tested exhaustively without a runtime, a store, or a
//! clock. The simulator and the ingress path both go through these
//! functions, which keeps the domain bounds in exactly one place.
//!
//! Rounding follows the persisted precision: state of charge carries two
//! decimal digits, temperature one.

use std::time::Duration;

use rand::Rng;

/// The simulator refuses to discharge below this state of charge.
///
/// This is a design choice (a protective floor), not a hardware limit.
/// Reaching the floor is the terminal condition of a discharge run.
pub const SOC_FLOOR: f64 = 20.0;

/// Upper bound of the state-of-charge domain, in percent.
pub const SOC_MAX: f64 = 100.0;

/// Lower bound of the battery temperature domain, in degrees Celsius.
pub const TEMP_MIN: f64 = 10.0;

/// Seconds in one hour, used to derive the per-tick discharge amount.
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Round to two decimal digits (state-of-charge precision).
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal digit (temperature precision).
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derive the fixed per-tick discharge amount from an hourly rate.
///
/// The hourly percentage is spread evenly across the ticks in one hour
/// and rounded to the persisted precision. At the reference settings
/// (10 %/hour, 10-second ticks, 360 ticks/hour) this yields 0.03 per
/// tick.
pub fn per_tick_discharge(hourly_percent: f64, tick_interval: Duration) -> f64 {
    let secs = tick_interval.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    let ticks_per_hour = SECONDS_PER_HOUR / secs;
    round2(hourly_percent / ticks_per_hour)
}

/// Apply one discharge step, clamped to the protective floor.
///
/// The result is monotonically non-increasing and never below
/// [`SOC_FLOOR`].
pub fn discharge_step(state_of_charge: f64, per_tick: f64) -> f64 {
    round2(state_of_charge - per_tick).max(SOC_FLOOR)
}

/// Apply one bounded random temperature perturbation.
///
/// The delta is uniform in `[-jitter, +jitter]`; the result is rounded
/// to one decimal digit and clamped to `[TEMP_MIN, max_temperature]`.
pub fn perturb_temperature<R: Rng>(
    rng: &mut R,
    temperature: f64,
    jitter: f64,
    max_temperature: f64,
) -> f64 {
    let delta = if jitter > 0.0 {
        rng.random_range(-jitter..=jitter)
    } else {
        0.0
    };
    round1(temperature + delta).clamp(TEMP_MIN, max_temperature)
}

/// Clamp an externally supplied state of charge to the general domain.
pub fn clamp_charge(state_of_charge: f64) -> f64 {
    state_of_charge.clamp(0.0, SOC_MAX)
}

/// Clamp an externally supplied temperature to the general domain.
pub fn clamp_temperature(temperature: f64, max_temperature: f64) -> f64 {
    temperature.clamp(TEMP_MIN, max_temperature)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn reference_rate_yields_three_hundredths_per_tick() {
        // 10 %/hour at 10-second ticks: 10 / 360 = 0.0278, rounded to 0.03.
        let per_tick = per_tick_discharge(10.0, Duration::from_secs(10));
        assert_eq!(per_tick, 0.03);
    }

    #[test]
    fn per_tick_scales_with_interval() {
        // 1-minute ticks: 10 / 60 = 0.1667, rounded to 0.17.
        assert_eq!(per_tick_discharge(10.0, Duration::from_secs(60)), 0.17);
        // Degenerate zero interval is treated as no discharge.
        assert_eq!(per_tick_discharge(10.0, Duration::ZERO), 0.0);
    }

    #[test]
    fn discharge_is_monotonic_and_floored() {
        let mut soc = 100.0;
        let per_tick = per_tick_discharge(10.0, Duration::from_secs(10));
        for _ in 0..5000 {
            let next = discharge_step(soc, per_tick);
            assert!(next <= soc, "charge must never increase while discharging");
            assert!(next >= SOC_FLOOR, "charge must never drop below the floor");
            soc = next;
        }
        assert_eq!(soc, SOC_FLOOR);
    }

    #[test]
    fn discharge_step_rounds_to_two_decimals() {
        assert_eq!(discharge_step(100.0, 0.03), 99.97);
        assert_eq!(discharge_step(99.97, 0.03), 99.94);
    }

    #[test]
    fn discharge_step_clamps_exactly_at_floor() {
        // One step from just above the floor lands exactly on it.
        assert_eq!(discharge_step(20.02, 0.03), SOC_FLOOR);
        assert_eq!(discharge_step(SOC_FLOOR, 0.03), SOC_FLOOR);
    }

    #[test]
    fn temperature_stays_in_domain() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut temp = 15.6;
        for _ in 0..10_000 {
            temp = perturb_temperature(&mut rng, temp, 0.1, 55.0);
            assert!((TEMP_MIN..=55.0).contains(&temp));
            // One decimal digit of precision.
            assert_eq!(temp, (temp * 10.0).round() / 10.0);
        }
    }

    #[test]
    fn temperature_clamps_at_bounds() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(perturb_temperature(&mut rng, 9.0, 0.0, 55.0), TEMP_MIN);
        assert_eq!(perturb_temperature(&mut rng, 80.0, 0.0, 55.0), 55.0);
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(perturb_temperature(&mut rng, 15.6, 0.0, 55.0), 15.6);
    }

    #[test]
    fn external_values_are_clamped() {
        assert_eq!(clamp_charge(45.0), 45.0);
        assert_eq!(clamp_charge(-3.0), 0.0);
        assert_eq!(clamp_charge(130.0), SOC_MAX);
        assert_eq!(clamp_temperature(22.1, 55.0), 22.1);
        assert_eq!(clamp_temperature(2.0, 55.0), TEMP_MIN);
        assert_eq!(clamp_temperature(90.0, 55.0), 55.0);
    }
}
