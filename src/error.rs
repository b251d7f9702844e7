use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("auth: {0}")]
    Auth(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("parse: {0}")]
    Parse(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("persistence: {0}")]
    Persistence(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Internal,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Parse(msg) => (StatusCode::BAD_REQUEST, msg),
            // Storage and persistence failures carry the backend message
            // verbatim so the caller sees exactly what was rejected.
            AppError::Storage(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Persistence(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound => (StatusCode::NOT_FOUND, "No encontrado".to_string()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor".to_string(),
            ),
        };

        if status.is_server_error() {
            error!("request failed: {} {}", status, message);
        }

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
