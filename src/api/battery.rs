use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::response::{Success, SuccessMessage};
use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateBatteryRequest {
    pub battery_id: u64,
    pub state_of_charge: f64,
    pub capacity_kwh: f64,
    pub max_power_watt: f64,
}

/// POST /battery
pub async fn create_battery(
    State(state): State<AppState>,
    Json(req): Json<CreateBatteryRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let assigned_id = tokio::task::spawn_blocking(move || {
        simulation.create_battery(req.state_of_charge, req.capacity_kwh, req.max_power_watt)
    })
    .await
    .expect("create_battery task panicked");

    tracing::debug!(battery_id = req_battery_id(&req), assigned_id, "battery registered");
    SuccessMessage::ok(format!("battery {assigned_id} registered")).into_response()
}

// The request carries the caller's own `battery_id` for correlation in
// their logs; the simulation core assigns its own internal id rather than
// trusting a caller-supplied one.
fn req_battery_id(req: &CreateBatteryRequest) -> u64 {
    req.battery_id
}

/// DELETE /batteries
pub async fn clear_batteries(State(state): State<AppState>) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    tokio::task::spawn_blocking(move || simulation.clear_batteries())
        .await
        .expect("clear_batteries task panicked");
    SuccessMessage::ok("all battery pools cleared").into_response()
}

#[derive(Debug, Serialize)]
struct BatteriesBody {
    batteries: crate::simulation::BatteriesSnapshot,
}

/// GET /batteries
pub async fn list_batteries(State(state): State<AppState>) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let snapshot = tokio::task::spawn_blocking(move || simulation.snapshot_batteries())
        .await
        .expect("snapshot_batteries task panicked");
    Success::new(BatteriesBody { batteries: snapshot })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_battery_id_is_kept_for_correlation_only() {
        let req = CreateBatteryRequest {
            battery_id: 42,
            state_of_charge: 0.5,
            capacity_kwh: 2.0,
            max_power_watt: 2000.0,
        };
        assert_eq!(req_battery_id(&req), 42);
    }
}
