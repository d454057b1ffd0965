//! Error handling for the settlement service

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{StageTransitionError, ValidationError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Order record failed validation ({} problems)", .errors.len())]
    Validation { errors: Vec<ValidationError> },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(#[from] StageTransitionError),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Persistence backend errors
    #[error("Persistence backend rejected the order ({status}): {message}")]
    PersistenceRejected { status: u16, message: String },

    #[error("Persistence backend unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    /// Network-level failures a caller may retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::PersistenceUnavailable(_))
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationError>>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
        }
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation { errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    details: Some(errors.clone()),
                    field: errors.first().map(|e| e.field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", "Order record failed validation")
                },
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("BAD_REQUEST", msg.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidStateTransition(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INVALID_STATE_TRANSITION", err.to_string()),
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", msg.clone()),
            ),
            AppError::PersistenceRejected { status, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "PERSISTENCE_REJECTED",
                    format!("Order store rejected the request ({}): {}", status, message),
                ),
            ),
            AppError::PersistenceUnavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "PERSISTENCE_UNAVAILABLE",
                    "Order store is temporarily unavailable",
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
