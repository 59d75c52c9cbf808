#![allow(dead_code)]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by direct battery operations.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BatteryError {
    #[error("charging power {requested}W is out of bounds {max}W")]
    OutOfRange { requested: f64, max: f64 },
}

/// A single charging entity tracked by the simulation.
///
/// `soc` is the unit-interval fraction of `capacity_kwh`. `soc_delta_per_tick`
/// is derived from `actual_power_w` and the simulation's slot resolution and
/// is recomputed whenever the charging power changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battery {
    pub id: u64,
    pub soc: f64,
    pub capacity_kwh: f64,
    pub max_power_w: f64,
    pub actual_power_w: f64,
    pub soc_delta_per_tick: f64,
    resolution_s: u32,
}

impl Battery {
    /// Creates a battery charging at its maximum power by default, mirroring
    /// how a freshly registered battery is assumed to charge until told
    /// otherwise.
    pub fn new(id: u64, soc: f64, capacity_kwh: f64, max_power_w: f64, resolution_s: u32) -> Self {
        let mut battery = Self {
            id,
            soc: soc.clamp(0.0, 1.0),
            capacity_kwh,
            max_power_w,
            actual_power_w: 0.0,
            soc_delta_per_tick: 0.0,
            resolution_s,
        };
        // Infallible: max_power_w is never out of bounds of itself.
        battery
            .set_charging_power(max_power_w)
            .expect("max_power_w must not exceed itself");
        battery
    }

    pub fn set_charging_power(&mut self, power_w: f64) -> Result<(), BatteryError> {
        if power_w > self.max_power_w {
            return Err(BatteryError::OutOfRange {
                requested: power_w,
                max: self.max_power_w,
            });
        }
        self.actual_power_w = power_w;
        self.soc_delta_per_tick = power_w * (self.resolution_s as f64 / 3600.0)
            / (self.capacity_kwh * 1000.0);
        Ok(())
    }

    /// Advances state of charge by one tick, clamping at full. Returns `true`
    /// iff the battery has just reached 1.0.
    pub fn update(&mut self) -> bool {
        self.soc += self.soc_delta_per_tick;
        if self.soc >= 1.0 {
            self.soc = 1.0;
            return true;
        }
        false
    }

    /// Number of slots (starting at `mask[0]`, inclusive of the returned
    /// index) needed until enough unblocked slots have elapsed to finish
    /// charging. `None` means the given suffix does not contain enough free
    /// slots.
    pub fn remaining_timesteps(&self, mask_suffix: &[bool]) -> Option<usize> {
        let needed_charge = 1.0 - self.soc;
        if needed_charge <= 0.0 {
            return Some(0);
        }
        let minimum_needed = (needed_charge / self.soc_delta_per_tick).ceil() as i64;
        let mut count_false = 0i64;
        for (i, blocked) in mask_suffix.iter().enumerate() {
            if !blocked {
                count_false += 1;
            }
            if count_false >= minimum_needed {
                return Some(i + 1);
            }
        }
        None
    }
}

impl std::fmt::Display for Battery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "B{}: soc {:.1}%, capacity {}kWh, charging {}W/{}W",
            self.id,
            self.soc * 100.0,
            self.capacity_kwh,
            self.actual_power_w,
            self.max_power_w
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_charging_power_rejects_overshoot() {
        let mut b = Battery::new(1, 0.5, 2.0, 2000.0, 60);
        assert_eq!(
            b.set_charging_power(2500.0),
            Err(BatteryError::OutOfRange {
                requested: 2500.0,
                max: 2000.0
            })
        );
    }

    #[test]
    fn update_clamps_at_full() {
        let mut b = Battery::new(1, 0.999, 2.0, 2000.0, 60);
        let done = b.update();
        assert!(done);
        assert_eq!(b.soc, 1.0);
    }

    #[test]
    fn remaining_timesteps_skips_blocked_slots() {
        // soc_delta_per_tick = 2000 * (60/3600) / (2*1000) = 0.01666...
        let b = Battery::new(1, 0.99, 2.0, 2000.0, 60);
        let mask = [false];
        assert_eq!(b.remaining_timesteps(&mask), Some(1));
    }

    #[test]
    fn remaining_timesteps_counts_only_free_slots() {
        let b = Battery::new(1, 0.98, 2.0, 2000.0, 60);
        // needs ceil(0.02/0.016666) = 2 free slots; slot 0 is blocked.
        let mask = [true, false, false];
        assert_eq!(b.remaining_timesteps(&mask), Some(3));
    }

    #[test]
    fn remaining_timesteps_reports_insufficient() {
        let b = Battery::new(1, 0.0, 2.0, 2000.0, 60);
        let mask = [false; 2];
        assert_eq!(b.remaining_timesteps(&mask), None);
    }
}
