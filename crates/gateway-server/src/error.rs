use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gateway_core::GatewayError;

/// Wraps [`GatewayError`] so it can be returned directly from an axum
/// handler; renders the OpenAI-shaped `{"error": {...}}` body at the
/// status documented for each error kind.
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "error": {
                "message": self.0.to_string(),
                "type": self.0.error_kind(),
            }
        }));
        (status, body).into_response()
    }
}
