//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use knohub_core::error::{AppError, ErrorKind};

use crate::dto::response::ApiResponse;

/// Message returned for oversized request bodies.
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "File exceeds the maximum upload size";

/// An [`AppError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::NameConflict => StatusCode::CONFLICT,
            ErrorKind::WrongKind
            | ErrorKind::InvalidTarget
            | ErrorKind::EmptyName
            | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Rendering => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::IoFailure
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;

        let message = match err.kind {
            ErrorKind::Database | ErrorKind::Internal => {
                tracing::error!(kind = %err.kind, error = ?err, "Internal server error");
                "Internal server error".to_string()
            }
            _ if status.is_server_error() => {
                tracing::error!(kind = %err.kind, error = ?err, "Request failed");
                err.message
            }
            _ => err.message,
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
