use axum::{response::IntoResponse, Json};
use serde::Serialize;

/// The `{success, message}` shape shared by every mutating endpoint.
#[derive(Debug, Serialize)]
pub struct SuccessMessage {
    pub success: bool,
    pub message: String,
}

impl SuccessMessage {
    pub fn ok(message: impl Into<String>) -> impl IntoResponse {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }
}

/// Wraps a payload with a leading `success: true` field, for GET endpoints
/// that report a named body (e.g. `{success, batteries: {...}}`).
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Json<Self> {
        Json(Self { success: true, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Body {
        count: usize,
    }

    #[test]
    fn success_flattens_body_fields() {
        let wrapped = Success::new(Body { count: 3 });
        let value = serde_json::to_value(&wrapped.0).unwrap();
        assert_eq!(value, json!({ "success": true, "count": 3 }));
    }
}
