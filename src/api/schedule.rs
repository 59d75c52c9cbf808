use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::response::{Success, SuccessMessage};
use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct DemandEstimationRequest {
    /// Seconds-since-midnight, each in `[0, 86400)`.
    pub demand: Vec<i64>,
}

/// PUT /demand-estimation
pub async fn set_demand(
    State(state): State<AppState>,
    Json(req): Json<DemandEstimationRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    tokio::task::spawn_blocking(move || simulation.set_demand(req.demand))
        .await
        .expect("set_demand task panicked");
    SuccessMessage::ok("demand profile updated").into_response()
}

#[derive(Debug, Deserialize)]
pub struct PriceProfileRequest {
    pub price: Vec<f64>,
    pub resolution_s: u32,
}

/// PUT /price-profile
pub async fn set_price_profile(
    State(state): State<AppState>,
    Json(req): Json<PriceProfileRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    tokio::task::spawn_blocking(move || simulation.set_price_profile(&req.price, req.resolution_s))
        .await
        .expect("set_price_profile task panicked");
    SuccessMessage::ok("price profile updated").into_response()
}

#[derive(Debug, Serialize)]
struct PriceProfileBody {
    price_profile: Vec<f64>,
}

/// GET /price-profile
pub async fn get_price_profile(State(state): State<AppState>) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let price_profile = tokio::task::spawn_blocking(move || simulation.price_profile())
        .await
        .expect("price_profile task panicked");
    Success::new(PriceProfileBody { price_profile })
}

#[derive(Debug, Serialize)]
struct SchedulesBody {
    schedules: crate::simulation::SchedulesSnapshot,
}

/// GET /schedules
pub async fn get_schedules(State(state): State<AppState>) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let snapshot = tokio::task::spawn_blocking(move || simulation.schedules_snapshot())
        .await
        .expect("schedules_snapshot task panicked");
    Success::new(SchedulesBody { schedules: snapshot })
}

#[derive(Debug, Serialize)]
struct VisualisationBody {
    current_time: String,
    optimized_schedule: Vec<i64>,
    optimized_load: Vec<f64>,
    optimized_cost: Vec<f64>,
    unoptimized_schedule: Vec<i64>,
    unoptimized_load: Vec<f64>,
    unoptimized_cost: Vec<f64>,
    price_profile: Vec<f64>,
    batteries: crate::simulation::BatteriesSnapshot,
    demand_events: Vec<i64>,
    battery_prognosis: BatteryPrognosis,
    pending_charge_requests: Vec<String>,
    pending_exchange_requests: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BatteryPrognosis {
    waiting: Vec<i64>,
    finished: Vec<i64>,
}

/// GET /visualisation
pub async fn visualisation(State(state): State<AppState>) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let view = tokio::task::spawn_blocking(move || simulation.visualisation())
        .await
        .expect("visualisation task panicked");

    let body = VisualisationBody {
        current_time: format_hms(view.current_time),
        optimized_schedule: view.optimized_schedule,
        optimized_load: view.optimized_load,
        optimized_cost: view.optimized_cost,
        unoptimized_schedule: view.unoptimized_schedule,
        unoptimized_load: view.unoptimized_load,
        unoptimized_cost: view.unoptimized_cost,
        price_profile: view.price_profile,
        batteries: view.batteries,
        demand_events: view.demand_events,
        battery_prognosis: BatteryPrognosis {
            waiting: view.prognose_waiting_batteries,
            finished: view.prognose_finished_batteries,
        },
        pending_charge_requests: view.pending_charge_requests,
        pending_exchange_requests: view.pending_exchange_requests,
    };

    Success::new(body)
}

/// Formats seconds-since-midnight (wrapping past a day) as `HH:MM:SS`.
fn format_hms(current_time: i64) -> String {
    const DAY_SECS: i64 = 86_400;
    let seconds_of_day = current_time.rem_euclid(DAY_SECS) as u32;
    chrono::NaiveTime::from_num_seconds_from_midnight_opt(seconds_of_day, 0)
        .expect("seconds_of_day is always < 86400")
        .format("%H:%M:%S")
        .to_string()
}

#[derive(Debug, Deserialize)]
pub struct RestartRequest {
    pub start_time: i64,
}

/// POST /restart
pub async fn restart(
    State(state): State<AppState>,
    Json(req): Json<RestartRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    tokio::task::spawn_blocking(move || simulation.restart(req.start_time))
        .await
        .expect("restart task panicked");
    SuccessMessage::ok("simulation restarted").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_hms_pads_and_wraps() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(86400 + 5), "00:00:05");
    }
}
