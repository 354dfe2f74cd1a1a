//! Error types for Shadow Signals

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error (missing price mapping, missing credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (malformed query parameters, malformed signal batch)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error (unknown tier id, unknown notification)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation is not valid in the current state (checkout on free tier)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Upstream provider failed on a path with no fallback
    ///
    /// Read endpoints never surface this variant; they degrade to a
    /// fallback dataset at the boundary instead.
    #[error("Upstream provider error: {0}")]
    Upstream(String),

    /// Payment provider webhook signature verification failed
    #[error("Signature verification failed: {0}")]
    Signature(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

/// Error response structure for API
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_response) = match &self {
            AppError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    reason: "configuration_error".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "rejected",
                    reason: "validation_failed".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    status: "rejected",
                    reason: "not_found".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::InvalidOperation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "rejected",
                    reason: "invalid_operation".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    status: "error",
                    reason: "upstream_error".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            AppError::Signature(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    status: "rejected",
                    reason: "invalid_signature".to_string(),
                    details: Some(msg.clone()),
                },
            ),
            // No internal state in the response body, only a short message
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    status: "error",
                    reason: "internal_error".to_string(),
                    details: None,
                },
            ),
        };

        // Log the error
        tracing::error!(
            error_type = %self,
            status_code = %status_code,
            "Request error"
        );

        (status_code, Json(json!(error_response))).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
