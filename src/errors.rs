//! Crate-wide error type with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A messaging provider rejected a send. `code` carries the mapped
    /// provider error code when one was returned.
    #[error("{channel} delivery failed: {message}")]
    Channel {
        channel: &'static str,
        code: Option<String>,
        message: String,
    },

    #[error("llm request failed: {0}")]
    Llm(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Channel { .. } => (StatusCode::BAD_GATEWAY, "channel_error"),
            AppError::Database(_)
            | AppError::Http(_)
            | AppError::Json(_)
            | AppError::Llm(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let code = match &self {
            AppError::Channel { code, .. } => code.clone(),
            _ => None,
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}

/// Result alias used throughout the crate.
pub type AppResult<T> = Result<T, AppError>;
