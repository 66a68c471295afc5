//! Error types for the RemitLend backend

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Main error type for the backend
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        param: Option<String>,
    },

    #[error("Route not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error envelope returned by every rejection the service produces
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl BackendError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to clients.
    ///
    /// Configuration and internal failures are summarised so operator
    /// detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Config(_) => "Server misconfiguration".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) => "Route not found".to_string(),
            Self::RateLimited { .. } => {
                "Too many requests, please try again later.".to_string()
            }
            Self::Forbidden(message) | Self::ServiceUnavailable(message) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.public_message())
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_error_response());

        let mut response = (status, body).into_response();

        if let BackendError::RateLimited { retry_after } = &self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation {
            message: err.to_string(),
            param: None,
        }
    }
}
