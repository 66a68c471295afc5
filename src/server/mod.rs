//! HTTP server implementation
//!
//! Assembles the Axum router: built-in endpoints, the mounted simulation
//! and score sub-APIs, API docs, and the middleware stack around them.

mod routes;
mod middleware;
mod handlers;
mod state;
pub mod shutdown;

pub use routes::*;
pub use middleware::*;
pub use handlers::*;
pub use state::*;
pub use shutdown::*;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware as axum_middleware, Router};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::config::BackendConfig;
use crate::docs::{docs_routes, ApiDoc};
use crate::security::{apply_security_middleware, protect, SecurityState};
use crate::telemetry::init_telemetry;

/// Run the backend server until a shutdown signal arrives
pub async fn run_server(config: BackendConfig, mounts: ApiMounts) -> anyhow::Result<()> {
    init_telemetry(&config.telemetry)?;

    let security_state = SecurityState::new(&config.security);
    let state = AppState::new(config.clone());

    if !security_state.gate.is_configured() {
        warn!("INTERNAL_API_KEY is not set; protected endpoints will respond with 500");
    }

    if security_state.rate_limiter.is_enabled() {
        security_state.rate_limiter.spawn_cleanup();
    }

    let shutdown_state = state.shutdown.clone();
    let app = create_router(state, security_state, mounts);

    let addr: SocketAddr = config.server.socket_addr()?;

    info!(
        "Starting RemitLend backend v{} on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );
    info!(origins = ?config.security.cors.allowed_origins, "CORS allowed origins");
    info!("Rate limiting: {}", if config.security.rate_limiting.enabled { "enabled" } else { "disabled" });
    info!("API docs: {}", if config.docs.enabled { "enabled" } else { "disabled" });

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(graceful_shutdown(shutdown_state))
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main router with all routes and middleware
pub fn create_router(state: AppState, security: SecurityState, mounts: ApiMounts) -> Router {
    let config = state.config.clone();

    let score = mounts
        .score
        .merge(protect(mounts.protected_score, security.gate.clone()));

    let mut router = Router::new()
        .merge(routes::health_routes().with_state(state.clone()))
        .nest(SIMULATION_PREFIX, mounts.simulation)
        .nest(SCORE_PREFIX, score);

    if config.docs.enabled {
        let doc = ApiDoc::new(&config.docs).operations(mounts.operations);
        router = router.merge(docs_routes(&doc));
    }

    let router = router.fallback(handlers::not_found);

    // Global security: origin guard, CORS, rate limiting
    let mut router = apply_security_middleware(router, &security)
        .layer(TimeoutLayer::new(config.server.request_timeout))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state.shutdown),
            request_tracking_middleware,
        ))
        .layer(TraceLayer::new_for_http());

    if config.server.request_logging {
        router = router.layer(axum_middleware::from_fn(logging_middleware));
    }

    router.layer(axum_middleware::from_fn(request_id_middleware))
}
