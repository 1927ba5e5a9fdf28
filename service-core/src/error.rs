use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Invalid media: {0}")]
    InvalidMedia(anyhow::Error),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Authentication error: {0}")]
    AuthError(anyhow::Error),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Uniform envelope for every failure; request_id is for log
        // correlation only, never replay.
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            message: String,
            request_id: String,
        }

        let (status, error_kind, message) = match self {
            AppError::ValidationError(err) => {
                (StatusCode::BAD_REQUEST, "validation_error", err.to_string())
            }
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, "bad_request", err.to_string()),
            AppError::InvalidMedia(err) => {
                (StatusCode::BAD_REQUEST, "invalid_media", err.to_string())
            }
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
            AppError::AuthError(err) => (StatusCode::UNAUTHORIZED, "auth_error", err.to_string()),
            AppError::BackendError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "backend_error", msg)
            }
            AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                err.to_string(),
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                err.to_string(),
            ),
        };

        let request_id = Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_kind = error_kind,
                "{}",
                message
            );
        }

        (
            status,
            Json(ErrorResponse {
                error: error_kind.to_string(),
                message,
                request_id,
            }),
        )
            .into_response()
    }
}
