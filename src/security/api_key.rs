//! Shared-secret access gate
//!
//! Protected routes require an `x-api-key` header whose value equals the
//! configured `INTERNAL_API_KEY`. The gate fails closed: without a
//! configured secret every protected request is answered with a 500.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use crate::config::security::{ApiKeyConfig, SharedSecret, API_KEY_HEADER};
use crate::error::ErrorResponse;

pub const MISCONFIGURED_MESSAGE: &str = "Server misconfiguration: INTERNAL_API_KEY is not set";
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorised: invalid or missing API key";

/// Rejection produced by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No secret configured on the server
    Misconfigured,
    /// Key missing or not matching. Deliberately carries no detail.
    Unauthorized,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Misconfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Misconfigured => MISCONFIGURED_MESSAGE,
            Self::Unauthorized => UNAUTHORIZED_MESSAGE,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.message());
        (self.status_code(), Json(body)).into_response()
    }
}

/// Access gate holding the expected secret
#[derive(Debug, Clone, Default)]
pub struct ApiKeyGate {
    secret: Option<SharedSecret>,
}

impl ApiKeyGate {
    pub fn new(secret: Option<SharedSecret>) -> Self {
        Self { secret }
    }

    pub fn from_config(config: &ApiKeyConfig) -> Self {
        Self::new(config.internal_api_key.clone())
    }

    /// Whether a secret is configured. Without one the gate rejects everything.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Decide whether a request may continue.
    ///
    /// `Ok(())` passes the request on; `Err` is the terminal response.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let expected = self.secret.as_ref().ok_or(AuthError::Misconfigured)?;

        // Exactly one x-api-key value; repeated headers never pass
        let mut values = headers.get_all(API_KEY_HEADER).iter();
        let presented = match (values.next(), values.next()) {
            (Some(value), None) => value,
            _ => return Err(AuthError::Unauthorized),
        };

        // ct_eq returns false for slices of different lengths
        if bool::from(presented.as_bytes().ct_eq(expected.expose())) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }
}

/// Middleware enforcing the gate on the routes it wraps
pub async fn require_api_key(
    State(gate): State<Arc<ApiKeyGate>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Err(rejection) = gate.check(request.headers()) {
        let path = request.uri().path();
        match rejection {
            AuthError::Misconfigured => error!(
                path = %path,
                "Rejecting protected request: INTERNAL_API_KEY is not set"
            ),
            AuthError::Unauthorized => warn!(
                path = %path,
                key_present = request.headers().contains_key(API_KEY_HEADER),
                "Rejected request with invalid or missing API key"
            ),
        }
        return Err(rejection);
    }

    Ok(next.run(request).await)
}
