use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use serde::Serialize;

use crate::config::SimulationConfig;
use crate::domain::{Battery, Schedule};
use crate::error::SimulationError;
use crate::optimizer;

/// A pending drone exchange: the fully-charged battery reserved for pickup,
/// and the depleted battery the drone will hand back once the swap happens.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub charged_battery: Battery,
    pub new_battery: Battery,
}

/// A read-only snapshot of the three battery pools plus outstanding
/// requests, shaped for the `/batteries` and `/visualisation` responses.
#[derive(Debug, Clone, Serialize)]
pub struct BatteriesSnapshot {
    pub waiting: Vec<Battery>,
    pub charging: Vec<Battery>,
    pub finished: Vec<Battery>,
    pub requests: HashMap<String, Request>,
}

/// Everything `/visualisation` reports in one composite payload.
#[derive(Debug, Clone, Serialize)]
pub struct Visualisation {
    pub current_time: i64,
    pub optimized_schedule: Vec<i64>,
    pub optimized_load: Vec<f64>,
    pub optimized_cost: Vec<f64>,
    pub unoptimized_schedule: Vec<i64>,
    pub unoptimized_load: Vec<f64>,
    pub unoptimized_cost: Vec<f64>,
    pub price_profile: Vec<f64>,
    pub batteries: BatteriesSnapshot,
    pub demand_events: Vec<i64>,
    pub prognose_waiting_batteries: Vec<i64>,
    pub prognose_finished_batteries: Vec<i64>,
    pub pending_charge_requests: Vec<String>,
    pub pending_exchange_requests: Vec<String>,
}

/// Everything `/schedules` reports.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulesSnapshot {
    pub resolution_seconds: u32,
    pub schedules: Vec<Vec<i64>>,
}

/// The simulation's single owner of mutable state: the three battery pools,
/// the pending-exchange map, the constraint mask, the price profile, the
/// demand event list, the wall clock, the id counter, and the most recent
/// optimized/baseline schedules. Every mutating operation replans before
/// returning, matching the request-handling contract of the original
/// source's `Simulation` class.
pub(crate) struct SimulationState {
    cfg: SimulationConfig,
    waiting: VecDeque<Battery>,
    charging: Vec<Battery>,
    finished: VecDeque<Battery>,
    requests: HashMap<String, Request>,
    /// `C`, already "from now": index 0 is the slot that starts this
    /// instant. Rolled forward one position per tick.
    mask: Vec<bool>,
    /// `P`, anchored at seconds-since-midnight 0 and assumed periodic with
    /// period `mask.len() * resolution_s`; rotated to "now" on every read.
    price: Vec<f64>,
    /// `D`, seconds-since-midnight, sorted.
    demand: Vec<i64>,
    current_time: i64,
    next_id: u64,
    optimized: Schedule,
    baseline: Schedule,
    last_feasible: bool,
}

impl SimulationState {
    pub(crate) fn new(cfg: SimulationConfig) -> Self {
        let slot_count = cfg.slot_count;
        Self {
            waiting: VecDeque::new(),
            charging: Vec::new(),
            finished: VecDeque::new(),
            requests: HashMap::new(),
            mask: vec![false; slot_count],
            price: vec![0.0; slot_count],
            demand: Vec::new(),
            current_time: 0,
            next_id: 0,
            optimized: Schedule::idle(slot_count),
            baseline: Schedule::idle(slot_count),
            last_feasible: true,
            cfg,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn total_batteries(&self) -> usize {
        self.waiting.len() + self.charging.len() + self.finished.len() + self.requests.len()
    }

    pub(crate) fn create_battery(&mut self, soc: f64, capacity_kwh: f64, max_power_w: f64) -> u64 {
        let id = self.next_id();
        let battery = Battery::new(id, soc, capacity_kwh, max_power_w, self.cfg.resolution_s);
        if battery.soc >= 1.0 {
            self.finished.push_back(battery);
        } else {
            self.waiting.push_back(battery);
        }
        self.replan(self.cfg.planner_time_budget());
        id
    }

    pub(crate) fn clear_batteries(&mut self) {
        self.waiting.clear();
        self.charging.clear();
        self.finished.clear();
        self.requests.clear();
    }

    pub(crate) fn restart(&mut self, start_time: i64) {
        self.clear_batteries();
        self.current_time = start_time;
    }

    pub(crate) fn check_request(&self) -> bool {
        !self.finished.is_empty()
    }

    pub(crate) fn add_request(
        &mut self,
        drone_id: String,
        soc: f64,
        capacity_kwh: f64,
        max_power_w: f64,
    ) -> Result<(), SimulationError> {
        if self.finished.is_empty() {
            return Err(SimulationError::Rejected);
        }
        let charged_battery = self.finished.pop_front().expect("checked non-empty above");
        let id = self.next_id();
        let new_battery = Battery::new(id, soc, capacity_kwh, max_power_w, self.cfg.resolution_s);
        self.requests
            .insert(drone_id, Request { charged_battery, new_battery });
        self.replan(self.cfg.planner_time_budget());
        Ok(())
    }

    pub(crate) fn exchange_battery(
        &mut self,
        drone_id: &str,
        actual_soc: f64,
    ) -> Result<Battery, SimulationError> {
        let mut request = self
            .requests
            .remove(drone_id)
            .ok_or_else(|| SimulationError::UnknownDrone(drone_id.to_string()))?;
        request.new_battery.soc = actual_soc.clamp(0.0, 1.0);
        self.waiting.push_back(request.new_battery);
        self.replan(self.cfg.planner_time_budget());
        Ok(request.charged_battery)
    }

    pub(crate) fn exchange_completed(&self, drone_id: &str) -> Result<(), SimulationError> {
        // `UnknownDrone` is raised whenever `drone_id` is not present in the
        // requests map (§7). This acknowledgment mutates no state itself —
        // the pool transition already happened synchronously inside
        // `exchange_battery` — it only validates that the id is one this
        // simulation actually knows about.
        if !self.requests.contains_key(drone_id) {
            return Err(SimulationError::UnknownDrone(drone_id.to_string()));
        }
        Ok(())
    }

    pub(crate) fn set_demand(&mut self, mut demand: Vec<i64>) {
        demand.sort_unstable();
        self.demand = demand;
        self.replan(self.cfg.planner_time_budget());
    }

    pub(crate) fn set_price_profile(&mut self, prices: &[f64], resolution_s: u32) {
        self.price = optimizer::resample_price(prices, resolution_s, self.cfg.slot_count, self.cfg.resolution_s);
        self.replan(self.cfg.planner_time_budget());
    }

    /// Rotates the (periodic, midnight-anchored) price profile so index 0
    /// is the slot starting now.
    fn rotated_price(&self) -> Vec<f64> {
        rotate_to_now(&self.price, self.current_time, self.cfg.resolution_s)
    }

    /// Rotates `demand` (seconds-since-midnight) into seconds-from-now,
    /// sorted ascending; used for the `/visualisation` report.
    fn demand_events_from_now(&self) -> Vec<i64> {
        const DAY_SECS: i64 = 86_400;
        let seconds_since_midnight = self.current_time.rem_euclid(DAY_SECS);
        let mut rotated: Vec<i64> = self
            .demand
            .iter()
            .map(|&event| (event - seconds_since_midnight).rem_euclid(DAY_SECS))
            .collect();
        rotated.sort_unstable();
        rotated
    }

    fn powers_by_id(&self) -> HashMap<u64, f64> {
        self.charging
            .iter()
            .chain(self.waiting.iter())
            .chain(self.finished.iter())
            .map(|b| (b.id, b.actual_power_w))
            .collect()
    }

    /// Runs the planner (§4.3): builds `d[]` from the demand list and
    /// current pool sizes, then calls into the greedy constraint search.
    fn replan(&mut self, budget: Duration) {
        let charging: Vec<Battery> = self.charging.clone();
        let waiting: Vec<Battery> = self.waiting.iter().cloned().collect();
        let max_events = self.total_batteries();
        let per_slot = optimizer::build_demand_per_slot(
            &self.demand,
            self.current_time,
            self.cfg.slot_count,
            self.cfg.resolution_s,
            max_events,
        );
        let already_available = (self.requests.len() + self.finished.len()) as i64;
        let demand_cumulative = optimizer::cumulative_demand(&per_slot, already_available);
        let price = self.rotated_price();

        let result = optimizer::optimize(
            &charging,
            &waiting,
            &mut self.mask,
            &price,
            &demand_cumulative,
            budget,
        );

        self.optimized = result.optimized;
        self.baseline = result.baseline;
        self.last_feasible = result.feasible;
        if !self.last_feasible {
            tracing::warn!(
                current_time = self.current_time,
                "demand cannot be met even with an unconstrained schedule"
            );
        }
    }

    /// Advances the pools by one slot (tick loop steps 1-4 of §4.4). The
    /// replan (step 5) is driven separately by the caller so it can measure
    /// the remaining per-tick budget.
    pub(crate) fn advance(&mut self) {
        if !self.mask.first().copied().unwrap_or(false) {
            let mut i = 0;
            while i < self.charging.len() {
                if self.charging[i].update() {
                    let done = self.charging.remove(i);
                    self.finished.push_back(done);
                } else {
                    i += 1;
                }
            }
        }

        while self.charging.len() < self.cfg.charger_count {
            match self.waiting.pop_front() {
                Some(battery) => self.charging.push(battery),
                None => break,
            }
        }

        optimizer::roll_left(&mut self.mask);
        self.current_time += self.cfg.resolution_s as i64;
    }

    pub(crate) fn replan_with_budget(&mut self, budget: Duration) {
        self.replan(budget);
    }

    pub(crate) fn tick_period(&self) -> Duration {
        self.cfg.tick_period()
    }

    pub(crate) fn planner_time_budget(&self) -> Duration {
        self.cfg.planner_time_budget()
    }

    pub(crate) fn snapshot_batteries(&self) -> BatteriesSnapshot {
        BatteriesSnapshot {
            waiting: self.waiting.iter().cloned().collect(),
            charging: self.charging.clone(),
            finished: self.finished.iter().cloned().collect(),
            requests: self.requests.clone(),
        }
    }

    pub(crate) fn schedules_snapshot(&self) -> SchedulesSnapshot {
        SchedulesSnapshot {
            resolution_seconds: self.cfg.resolution_s,
            schedules: vec![self.optimized.slots.clone()],
        }
    }

    pub(crate) fn price_profile_now(&self) -> Vec<f64> {
        self.rotated_price()
    }

    pub(crate) fn visualisation(&self) -> Visualisation {
        let powers = self.powers_by_id();
        let flat_mask = vec![false; self.mask.len()];

        let optimized_load = self.optimized.load_curve(&self.mask, &powers);
        let price = self.rotated_price();
        let optimized_cost = Schedule::cost_curve(&optimized_load, &price, self.cfg.resolution_s);

        let unoptimized_load = self.baseline.load_curve(&flat_mask, &powers);
        let unoptimized_cost = Schedule::cost_curve(&unoptimized_load, &price, self.cfg.resolution_s);

        let (prognose_waiting_batteries, prognose_finished_batteries) = self.prognosis();

        Visualisation {
            current_time: self.current_time,
            optimized_schedule: self.optimized.slots.clone(),
            optimized_load,
            optimized_cost,
            unoptimized_schedule: self.baseline.slots.clone(),
            unoptimized_load,
            unoptimized_cost,
            price_profile: price,
            batteries: self.snapshot_batteries(),
            demand_events: self.demand_events_from_now(),
            prognose_waiting_batteries,
            prognose_finished_batteries,
            pending_charge_requests: self.requests.keys().cloned().collect(),
            pending_exchange_requests: self.requests.keys().cloned().collect(),
        }
    }

    /// `prognose_waiting_batteries`/`prognose_finished_batteries`: the
    /// initial pool sizes, adjusted by the cumulative count of
    /// distinct-battery transitions in the optimized schedule.
    ///
    /// The two pools decrement/increment on different transition sets.
    /// `finished` counts every transition, including the trailing
    /// battery→idle one once a charge completes. `waiting` only counts
    /// transitions whose destination is a battery id (idle→battery or
    /// battery→battery) — a battery→idle transition does not pull anything
    /// new out of `waiting`, so it must not decrement it a second time.
    fn prognosis(&self) -> (Vec<i64>, Vec<i64>) {
        let slots = &self.optimized.slots;
        let mut transitions_all = Vec::with_capacity(slots.len());
        let mut transitions_into_battery = Vec::with_capacity(slots.len());
        let mut previous: Option<i64> = None;
        let mut cumulative_all = 0i64;
        let mut cumulative_into_battery = 0i64;
        for (i, &id) in slots.iter().enumerate() {
            if i > 0 && Some(id) != previous {
                cumulative_all += 1;
                if id != -1 {
                    cumulative_into_battery += 1;
                }
            }
            transitions_all.push(cumulative_all);
            transitions_into_battery.push(cumulative_into_battery);
            previous = Some(id);
        }

        let start_waiting = self.waiting.len() as i64;
        let start_finished = self.finished.len() as i64;
        let prognose_waiting = transitions_into_battery
            .iter()
            .map(|&c| start_waiting - c)
            .collect();
        let prognose_finished = transitions_all.iter().map(|&c| start_finished + c).collect();
        (prognose_waiting, prognose_finished)
    }
}

/// Rotates a periodic, midnight-anchored array so index 0 is "now".
/// Composing this with [`unrotate_from_now`] is the identity (§8, Laws).
pub(crate) fn rotate_to_now(series: &[f64], current_time: i64, resolution_s: u32) -> Vec<f64> {
    let period = series.len();
    if period == 0 {
        return Vec::new();
    }
    let res = resolution_s as i64;
    let period_s = period as i64 * res;
    let offset = (current_time.rem_euclid(period_s) / res) as usize % period;
    rotate_left(series, offset)
}

/// Inverse of [`rotate_to_now`]: reconstructs the midnight-anchored array
/// from a "from now" view.
pub(crate) fn unrotate_from_now(series: &[f64], current_time: i64, resolution_s: u32) -> Vec<f64> {
    let period = series.len();
    if period == 0 {
        return Vec::new();
    }
    let res = resolution_s as i64;
    let period_s = period as i64 * res;
    let offset = (current_time.rem_euclid(period_s) / res) as usize % period;
    rotate_left(series, period - offset)
}

fn rotate_left(series: &[f64], offset: usize) -> Vec<f64> {
    let period = series.len();
    let offset = offset % period;
    let mut out = Vec::with_capacity(period);
    out.extend_from_slice(&series[offset..]);
    out.extend_from_slice(&series[..offset]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimulationConfig {
        SimulationConfig {
            resolution_s: 60,
            slot_count: 1440,
            charger_count: 1,
            simulation_time_factor: 60.0,
            default_max_power_w: 2000.0,
            planner_time_budget_ms: 200,
        }
    }

    #[test]
    fn create_battery_routes_full_soc_to_finished() {
        let mut state = SimulationState::new(cfg());
        let id = state.create_battery(1.0, 2.0, 2000.0);
        assert_eq!(state.finished.len(), 1);
        assert_eq!(state.finished[0].id, id);
        assert!(state.waiting.is_empty());
    }

    #[test]
    fn create_battery_routes_partial_soc_to_waiting() {
        let mut state = SimulationState::new(cfg());
        state.create_battery(0.5, 2.0, 2000.0);
        assert_eq!(state.waiting.len(), 1);
        assert!(state.finished.is_empty());
    }

    #[test]
    fn add_request_rejects_when_nothing_finished() {
        let mut state = SimulationState::new(cfg());
        let err = state
            .add_request("drone-1".into(), 0.2, 2.0, 2000.0)
            .unwrap_err();
        assert_eq!(err, SimulationError::Rejected);
    }

    #[test]
    fn exchange_cycle_reserves_and_releases_batteries() {
        let mut state = SimulationState::new(cfg());
        state.create_battery(1.0, 2.0, 2000.0);
        assert!(state.check_request());

        state.add_request("drone-1".into(), 0.3, 2.0, 2000.0).unwrap();
        assert!(state.finished.is_empty());
        assert_eq!(state.requests.len(), 1);

        let charged = state.exchange_battery("drone-1", 0.2).unwrap();
        assert_eq!(charged.soc, 1.0);
        assert!(state.requests.is_empty());
        assert_eq!(state.waiting.len() + state.charging.len(), 1);
    }

    #[test]
    fn exchange_unknown_drone_is_rejected() {
        let mut state = SimulationState::new(cfg());
        let err = state.exchange_battery("ghost", 0.5).unwrap_err();
        assert_eq!(err, SimulationError::UnknownDrone("ghost".to_string()));
    }

    #[test]
    fn restart_clears_pools_and_sets_clock() {
        let mut state = SimulationState::new(cfg());
        state.create_battery(0.5, 2.0, 2000.0);
        state.restart(3600);
        assert!(state.waiting.is_empty());
        assert_eq!(state.current_time, 3600);
    }

    #[test]
    fn constraint_mask_ages_across_ticks() {
        let mut state = SimulationState::new(cfg());
        state.mask[0] = true;
        state.mask[1] = true;
        state.mask[2] = true;
        state.advance();
        state.advance();
        assert!(state.mask[0]);
        assert!(!state.mask[1]);
        assert!(!state.mask[2]);
    }

    #[test]
    fn charger_promotion_drains_waiting_in_insertion_order() {
        let mut state = SimulationState::new(cfg());
        state.create_battery(0.5, 2.0, 2000.0);
        state.create_battery(0.9, 2.0, 2000.0);
        state.advance();
        assert_eq!(state.charging.len(), 1);
        assert_eq!(state.charging[0].soc, 0.5);
        assert_eq!(state.waiting.len(), 1);
    }

    #[test]
    fn rotation_round_trips() {
        let series: Vec<f64> = (0..24).map(|i| i as f64).collect();
        let forward = rotate_to_now(&series, 5 * 3600, 3600);
        let back = unrotate_from_now(&forward, 5 * 3600, 3600);
        assert_eq!(back, series);
    }

    #[test]
    fn demand_events_from_now_wraps_around_midnight() {
        let mut state = SimulationState::new(cfg());
        state.set_demand(vec![0, 3600]);
        state.current_time = 7200;
        let rotated = state.demand_events_from_now();
        // both events are "behind" now, so they wrap to (86400 - elapsed).
        assert_eq!(rotated, vec![82800, 86400 - 3600]);
    }

    #[test]
    fn prognosis_tracks_schedule_transitions() {
        let mut state = SimulationState::new(cfg());
        state.create_battery(0.99, 2.0, 2000.0);
        let (waiting_prognosis, finished_prognosis) = state.prognosis();
        assert_eq!(waiting_prognosis[0], 1);
        assert_eq!(finished_prognosis[0], 0);
    }
}
