#![allow(dead_code)]
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Battery;

/// A slot-indexed assignment of charger time to batteries. `-1` marks an
/// idle slot; any other value is a battery id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub slots: Vec<i64>,
}

impl Schedule {
    pub fn idle(slot_count: usize) -> Self {
        Self {
            slots: vec![-1; slot_count],
        }
    }

    /// Generates a plan by charging `charging` batteries first (they cannot
    /// be preempted), then `waiting` batteries ordered by state of charge
    /// descending (closest to finishing first), against the given
    /// constraint mask.
    pub fn build(charging: &[Battery], waiting: &[Battery], mask: &[bool]) -> Self {
        let slot_count = mask.len();
        let mut slots = vec![-1i64; slot_count];

        let mut ordered: Vec<&Battery> = charging.iter().collect();
        let mut waiting_sorted: Vec<&Battery> = waiting.iter().collect();
        waiting_sorted.sort_by(|a, b| {
            b.soc
                .partial_cmp(&a.soc)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ordered.extend(waiting_sorted);

        let mut cursor = 0usize;
        for battery in ordered {
            if cursor >= slot_count {
                break;
            }
            match battery.remaining_timesteps(&mask[cursor..]) {
                None => {
                    for slot in &mut slots[cursor..] {
                        *slot = battery.id as i64;
                    }
                    cursor = slot_count;
                    break;
                }
                Some(k) => {
                    let end = (cursor + k).min(slot_count);
                    for slot in &mut slots[cursor..end] {
                        *slot = battery.id as i64;
                    }
                    cursor = end;
                }
            }
        }

        Self { slots }
    }

    /// A schedule is feasible iff, at every slot, the cumulative number of
    /// distinct-battery transitions so far is at least the cumulative demand
    /// at that slot.
    pub fn is_feasible(&self, demand_cumulative: &[i64]) -> bool {
        let mut completions = 0i64;
        let mut previous: Option<i64> = None;
        for (i, &id) in self.slots.iter().enumerate() {
            if let Some(prev) = previous {
                if prev != id {
                    completions += 1;
                }
            }
            previous = Some(id);
            if completions < demand_cumulative.get(i).copied().unwrap_or(0) {
                return false;
            }
        }
        true
    }

    pub fn load_curve(&self, mask: &[bool], powers_by_id: &HashMap<u64, f64>) -> Vec<f64> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                if mask.get(i).copied().unwrap_or(false) || id < 0 {
                    0.0
                } else {
                    powers_by_id.get(&(id as u64)).copied().unwrap_or(0.0)
                }
            })
            .collect()
    }

    /// Per-slot cost in euros, given load in watts and price in €/MWh.
    ///
    /// The division by 1_000_000 converts W · s · (€/MWh) into €: energy in
    /// Wh times price-per-MWh divided by 1e6 gives price-per-Wh billing.
    pub fn cost_curve(load_w: &[f64], price_eur_per_mwh: &[f64], resolution_s: u32) -> Vec<f64> {
        load_w
            .iter()
            .zip(price_eur_per_mwh)
            .map(|(load, price)| load * (resolution_s as f64 / 3600.0) * (price / 1_000_000.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn battery(id: u64, soc: f64) -> Battery {
        Battery::new(id, soc, 2.0, 2000.0, 60)
    }

    #[test]
    fn build_assigns_highest_soc_first() {
        let waiting = vec![battery(1, 0.5), battery(2, 0.99)];
        let mask = vec![false; 4];
        let schedule = Schedule::build(&[], &waiting, &mask);
        // battery 2 needs one slot and goes first.
        assert_eq!(schedule.slots[0], 2);
    }

    #[test]
    fn charging_batteries_are_not_preempted() {
        let charging = vec![battery(1, 0.99)];
        let waiting = vec![battery(2, 0.999)];
        let mask = vec![false; 4];
        let schedule = Schedule::build(&charging, &waiting, &mask);
        assert_eq!(schedule.slots[0], 1);
    }

    #[test]
    fn feasibility_checks_cumulative_completions() {
        let waiting = vec![battery(1, 0.99)];
        let mask = vec![false; 3];
        let schedule = Schedule::build(&[], &waiting, &mask);
        assert!(schedule.is_feasible(&[0, 1, 1]));
        assert!(!schedule.is_feasible(&[1, 1, 1]));
    }

    #[test]
    fn idempotent_on_identical_inputs() {
        let waiting = vec![battery(1, 0.5), battery(2, 0.8)];
        let mask = vec![false, true, false, false, false];
        let a = Schedule::build(&[], &waiting, &mask);
        let b = Schedule::build(&[], &waiting, &mask);
        assert_eq!(a.slots, b.slots);
    }

    #[test]
    fn cost_curve_scales_by_resolution_and_price() {
        let load = vec![2000.0];
        let price = vec![100.0];
        let cost = Schedule::cost_curve(&load, &price, 3600);
        assert!((cost[0] - 0.2).abs() < 1e-9);
    }
}
