//! Mapping of domain errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;
use wifinet_core::WifinetError;

use crate::models::ErrorResponse;

/// Handler error: a domain error rendered as `{error, message}` JSON.
#[derive(Debug)]
pub struct ApiError(pub WifinetError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<WifinetError> for ApiError {
    fn from(err: WifinetError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(WifinetError::Auth(message.into()))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self(WifinetError::Validation(message.into()))
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            WifinetError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            WifinetError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
            WifinetError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            WifinetError::Auth(_) => (StatusCode::UNAUTHORIZED, "auth_failed"),
            WifinetError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            WifinetError::Provisioning(_) => (StatusCode::BAD_GATEWAY, "provisioning_failed"),
            WifinetError::Config(_)
            | WifinetError::Store(_)
            | WifinetError::Serialization(_)
            | WifinetError::Io(_)
            | WifinetError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            error!(error = %self.0, "Request failed");
            metrics::counter!("api.errors").increment(1);
            "Internal processing error".to_string()
        } else {
            self.0.to_string()
        };
        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}
