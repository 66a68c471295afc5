//! CORS policy
//!
//! Two pieces work together:
//! - a tower-http [`CorsLayer`] answering preflights and decorating
//!   responses for allowed origins
//! - [`origin_guard_middleware`], which refuses requests from origins that
//!   are not on the list instead of silently serving them without headers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::config::security::CorsConfig;
use crate::error::BackendError;

pub const CORS_REJECTION_MESSAGE: &str = "Not allowed by CORS";

/// Build CORS layer from configuration
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    let origins: Vec<HeaderValue> = config.allowed_origins.iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors = cors.allow_origin(AllowOrigin::list(origins));

    let methods: Vec<Method> = config.allowed_methods.iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    cors = cors.allow_methods(methods);

    let headers: Vec<HeaderName> = config.allowed_headers.iter()
        .filter_map(|h| h.parse().ok())
        .collect();
    cors = cors.allow_headers(headers);

    if config.allow_credentials {
        cors = cors.allow_credentials(true);
    }

    if let Some(max_age) = config.max_age_seconds {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    cors
}

/// Reject requests carrying an `Origin` that is not allowed
pub async fn origin_guard_middleware(
    State(config): State<Arc<CorsConfig>>,
    request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());

    if !config.is_origin_allowed(origin) {
        warn!(
            origin = %origin.unwrap_or_default(),
            path = %request.uri().path(),
            "Blocked cross-origin request"
        );
        return Err(BackendError::Forbidden(CORS_REJECTION_MESSAGE.to_string()));
    }

    Ok(next.run(request).await)
}
