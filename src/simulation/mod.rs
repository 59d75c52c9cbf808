mod state;

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::config::SimulationConfig;
use crate::domain::Battery;
use crate::error::SimulationError;

pub use state::{BatteriesSnapshot, Request, SchedulesSnapshot, Visualisation};

/// The concurrent simulation core: a single mutex around all mutable state,
/// cloneable so every axum handler and the background tick thread can share
/// one instance. Mirrors the single shared-lock design of the original
/// `Simulation` class — there is deliberately one lock, not one per pool,
/// because every operation that reads one pool's size also needs to
/// re-plan against the others.
#[derive(Clone)]
pub struct Simulation {
    inner: Arc<Mutex<state::SimulationState>>,
}

impl Simulation {
    pub fn new(cfg: SimulationConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state::SimulationState::new(cfg))),
        }
    }

    /// Spawns the background tick-loop thread. The loop sleeps outside the
    /// lock so handlers are never starved, and skips (rather than queues)
    /// its sleep when a re-plan overruns the tick period, logging a warning
    /// instead of falling behind silently.
    pub fn spawn_tick_loop(&self) -> thread::JoinHandle<()> {
        let simulation = self.clone();
        thread::spawn(move || loop {
            let tick_period = {
                let state = simulation.inner.lock();
                state.tick_period()
            };
            let started = std::time::Instant::now();

            {
                let mut state = simulation.inner.lock();
                state.advance();
                let remaining = tick_period.saturating_sub(started.elapsed());
                state.replan_with_budget(remaining.max(std::time::Duration::from_millis(1)));
            }

            let elapsed = started.elapsed();
            if elapsed >= tick_period {
                tracing::warn!(
                    ?elapsed,
                    ?tick_period,
                    "simulation tick overran its budget; skipping sleep"
                );
                continue;
            }
            thread::sleep(tick_period - elapsed);
        })
    }

    pub fn create_battery(&self, soc: f64, capacity_kwh: f64, max_power_w: f64) -> u64 {
        self.inner.lock().create_battery(soc, capacity_kwh, max_power_w)
    }

    pub fn clear_batteries(&self) {
        self.inner.lock().clear_batteries();
    }

    pub fn restart(&self, start_time: i64) {
        self.inner.lock().restart(start_time);
    }

    pub fn check_request(&self) -> bool {
        self.inner.lock().check_request()
    }

    pub fn add_request(
        &self,
        drone_id: String,
        soc: f64,
        capacity_kwh: f64,
        max_power_w: f64,
    ) -> Result<(), SimulationError> {
        self.inner.lock().add_request(drone_id, soc, capacity_kwh, max_power_w)
    }

    pub fn exchange_battery(&self, drone_id: &str, actual_soc: f64) -> Result<Battery, SimulationError> {
        self.inner.lock().exchange_battery(drone_id, actual_soc)
    }

    pub fn exchange_completed(&self, drone_id: &str) -> Result<(), SimulationError> {
        self.inner.lock().exchange_completed(drone_id)
    }

    pub fn set_demand(&self, demand_seconds_of_day: Vec<i64>) {
        self.inner.lock().set_demand(demand_seconds_of_day);
    }

    pub fn set_price_profile(&self, prices: &[f64], resolution_s: u32) {
        self.inner.lock().set_price_profile(prices, resolution_s);
    }

    pub fn snapshot_batteries(&self) -> BatteriesSnapshot {
        self.inner.lock().snapshot_batteries()
    }

    pub fn schedules_snapshot(&self) -> SchedulesSnapshot {
        self.inner.lock().schedules_snapshot()
    }

    pub fn price_profile(&self) -> Vec<f64> {
        self.inner.lock().price_profile_now()
    }

    pub fn visualisation(&self) -> Visualisation {
        self.inner.lock().visualisation()
    }
}
