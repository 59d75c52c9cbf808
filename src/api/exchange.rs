use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::response::SuccessMessage;
use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    pub drone_id: String,
    pub state_of_charge: f64,
    pub capacity_kwh: f64,
    pub max_power_watt: f64,
    /// Carried for correlation with the drone's own ETA estimate; the
    /// simulation core does not use it to schedule anything.
    #[serde(default)]
    pub delta_eta_seconds: Option<i64>,
}

/// POST /charge-request
pub async fn charge_request(
    State(state): State<AppState>,
    Json(req): Json<ChargeRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let drone_id = req.drone_id.clone();
    let result = tokio::task::spawn_blocking(move || {
        simulation.add_request(req.drone_id, req.state_of_charge, req.capacity_kwh, req.max_power_watt)
    })
    .await
    .expect("add_request task panicked");

    match result {
        Ok(()) => SuccessMessage::ok(format!("charge request accepted for {drone_id}")).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub drone_id: String,
    pub state_of_charge: f64,
    pub response_uri: Option<String>,
}

/// PUT /exchange
///
/// Performs the swap synchronously, then — if the caller gave a
/// `response_uri` — fires the completion webhook on a detached task so the
/// HTTP response is not held up by an outbound network call.
pub async fn exchange_battery(
    State(state): State<AppState>,
    Json(req): Json<ExchangeRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let drone_id = req.drone_id.clone();
    let result = tokio::task::spawn_blocking(move || {
        simulation.exchange_battery(&req.drone_id, req.state_of_charge)
    })
    .await
    .expect("exchange_battery task panicked");

    let charged = match result {
        Ok(battery) => battery,
        Err(err) => return ApiError::from(err).into_response(),
    };

    if let Some(uri) = req.response_uri {
        let client = state.http_client.clone();
        let drone_id = drone_id.clone();
        tokio::spawn(async move {
            let payload = serde_json::json!({ "drone_id": drone_id, "status": "exchanged" });
            if let Err(err) = client.post(&uri).json(&payload).send().await {
                tracing::warn!(%err, %uri, "exchange completion webhook failed");
            }
        });
    }

    tracing::debug!(drone_id, battery_id = charged.id, "battery exchanged");
    SuccessMessage::ok(format!("battery exchanged for {drone_id}")).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ExchangeCompletedRequest {
    pub drone_id: String,
}

/// PUT /exchange-completed
pub async fn exchange_completed(
    State(state): State<AppState>,
    Json(req): Json<ExchangeCompletedRequest>,
) -> impl IntoResponse {
    let simulation = state.simulation.clone();
    let drone_id = req.drone_id.clone();
    let result = tokio::task::spawn_blocking(move || simulation.exchange_completed(&req.drone_id))
        .await
        .expect("exchange_completed task panicked");

    match result {
        Ok(()) => SuccessMessage::ok(format!("exchange completion acknowledged for {drone_id}")).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
