//! Security Middleware Stack
//!
//! Combines the CORS guard, rate limiter and access gate into layers with
//! a fixed ordering.

use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};

use crate::config::security::{CorsConfig, SecurityConfig};

use super::{
    api_key::{require_api_key, ApiKeyGate},
    cors::{build_cors_layer, origin_guard_middleware},
    rate_limit::{rate_limit_middleware, RateLimiter},
};

/// Security state containing all security-related components
#[derive(Clone)]
pub struct SecurityState {
    pub gate: Arc<ApiKeyGate>,
    pub rate_limiter: Arc<RateLimiter>,
    pub cors_config: Arc<CorsConfig>,
}

impl SecurityState {
    /// Create security state from configuration
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            gate: Arc::new(ApiKeyGate::from_config(&config.api_key)),
            rate_limiter: Arc::new(RateLimiter::new(Arc::new(config.rate_limiting.clone()))),
            cors_config: Arc::new(config.cors.clone()),
        }
    }
}

/// Apply the global security middleware to a router
///
/// Execution order for an incoming request:
/// 1. Origin guard (reject unlisted origins)
/// 2. CORS (answer preflights, decorate responses)
/// 3. Rate limiting
pub fn apply_security_middleware<S>(router: Router<S>, security: &SecurityState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = build_cors_layer(&security.cors_config);

    // Layers added later wrap earlier ones
    router
        .layer(axum_middleware::from_fn_with_state(
            security.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(axum_middleware::from_fn_with_state(
            security.cors_config.clone(),
            origin_guard_middleware,
        ))
}

/// Put every route of `router` behind the access gate.
///
/// Applied as a route layer so unmatched paths still 404 instead of 401.
/// A router without routes is returned untouched, since `route_layer`
/// panics on it.
pub fn protect<S>(router: Router<S>, gate: Arc<ApiKeyGate>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if !router.has_routes() {
        return router;
    }
    router.route_layer(axum_middleware::from_fn_with_state(gate, require_api_key))
}

/// Security configuration with rate limiting off, for tests
pub fn test_security_config() -> SecurityConfig {
    SecurityConfig {
        rate_limiting: crate::config::security::RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        ..Default::default()
    }
}
