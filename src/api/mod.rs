pub mod battery;
pub mod error;
pub mod exchange;
pub mod health;
pub mod response;
pub mod schedule;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::simulation::Simulation;

/// Shared state handed to every handler: the simulation core and the HTTP
/// client used for the exchange-completion webhook.
#[derive(Clone)]
pub struct AppState {
    pub simulation: Simulation,
    pub http_client: reqwest::Client,
}

/// Builds the full API router, nested under `/api/v1` with a permissive
/// CORS layer and request tracing, matching §6 of the operation table.
pub fn router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/battery", post(battery::create_battery))
        .route("/batteries", delete(battery::clear_batteries).get(battery::list_batteries))
        .route("/charge-request", post(exchange::charge_request))
        .route("/exchange", put(exchange::exchange_battery))
        .route("/exchange-completed", put(exchange::exchange_completed))
        .route("/demand-estimation", put(schedule::set_demand))
        .route(
            "/price-profile",
            put(schedule::set_price_profile).get(schedule::get_price_profile),
        )
        .route("/schedules", get(schedule::get_schedules))
        .route("/visualisation", get(schedule::visualisation))
        .route("/restart", post(schedule::restart))
        .route("/healthz", get(health::healthz))
        .with_state(state);

    Router::new()
        .nest("/api/v1", v1)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
