use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::SimulationError;

/// Error envelope returned by every handler on failure, matching the
/// `{success, message}` shape the rest of the API uses on success.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

/// Maps a [`SimulationError`] to the HTTP status and JSON body the API
/// surfaces to a caller. `Infeasible` and `Overrun` are never produced by a
/// handler (they are tick-loop/planner conditions logged in place), but are
/// matched here so the mapping stays total if that ever changes.
pub struct ApiError(pub SimulationError);

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SimulationError::OutOfRange(_) => StatusCode::BAD_REQUEST,
            SimulationError::Rejected => StatusCode::OK,
            SimulationError::UnknownDrone(_) => StatusCode::NOT_FOUND,
            SimulationError::Infeasible | SimulationError::Overrun => StatusCode::OK,
        };

        tracing::debug!(error = %self.0, "request rejected");

        let body = ErrorBody {
            success: false,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BatteryError;

    #[test]
    fn out_of_range_maps_to_bad_request() {
        let err = ApiError(SimulationError::OutOfRange(BatteryError::OutOfRange {
            requested: 100.0,
            max: 50.0,
        }));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejected_is_reported_as_ok_with_success_false() {
        let err = ApiError(SimulationError::Rejected);
        assert_eq!(err.into_response().status(), StatusCode::OK);
    }

    #[test]
    fn unknown_drone_maps_to_not_found() {
        let err = ApiError(SimulationError::UnknownDrone("ghost".into()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
