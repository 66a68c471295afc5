//! HTTP request handlers for the built-in endpoints

use axum::{
    extract::State,
    http::Uri,
    Json,
};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::error::BackendError;

/// Body of `GET /`
pub const ROOT_MESSAGE: &str = "RemitLend Backend is running";

/// Health report returned by `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Seconds since the server started
    pub uptime: f64,
    /// Unix time in milliseconds
    pub timestamp: i64,
}

/// GET /
pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime: state.shutdown.uptime().as_secs_f64(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> BackendError {
    BackendError::NotFound(uri.path().to_string())
}
