//! Error to HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use engine_rest_core::{EngineError, RestError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// Handler error. Renders as `{"type": .., "message": ..}` with the status
/// given by [`RestError::http_status`].
#[derive(Debug)]
pub struct AppError(pub RestError);

impl AppError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self(RestError::invalid_request(message))
    }
}

impl From<RestError> for AppError {
    fn from(err: RestError) -> Self {
        Self(err)
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        Self(RestError::from(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        let body = ErrorResponse {
            error_type: self.0.error_type().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
