use axum::{http::StatusCode, response::IntoResponse};

/// GET /healthz - liveness probe. The simulation core has no external
/// dependencies to check, so liveness is simply "the process answers".
pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
