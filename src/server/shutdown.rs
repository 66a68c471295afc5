//! Graceful Shutdown
//!
//! Connection draining for SIGINT/SIGTERM:
//! - tracks in-flight requests
//! - rejects new requests once draining starts
//! - waits for existing requests up to the drain timeout

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

use crate::error::BackendError;

/// Shutdown state for tracking in-flight requests
#[derive(Debug)]
pub struct ShutdownState {
    /// Number of in-flight requests
    in_flight: AtomicU64,
    /// Whether we're in draining mode
    draining: AtomicBool,
    /// Drain timeout
    drain_timeout: Duration,
    /// Server start time
    start_time: Instant,
}

impl ShutdownState {
    /// Create new shutdown state
    pub fn new(drain_timeout: Duration) -> Self {
        Self {
            in_flight: AtomicU64::new(0),
            draining: AtomicBool::new(false),
            drain_timeout,
            start_time: Instant::now(),
        }
    }

    /// Mark a request as started
    pub fn request_started(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark a request as completed
    pub fn request_completed(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Get the number of in-flight requests
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Check if we're draining
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    /// Start draining (stop accepting new requests)
    pub fn start_drain(&self) {
        info!("Starting graceful shutdown, marking as draining");
        self.draining.store(true, Ordering::SeqCst);
    }

    /// Get uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Wait for all in-flight requests to complete
    pub async fn wait_for_drain(&self) {
        let drain_start = Instant::now();

        while self.in_flight_count() > 0 {
            if drain_start.elapsed() > self.drain_timeout {
                warn!(
                    remaining_requests = self.in_flight_count(),
                    "Drain timeout exceeded, forcing shutdown"
                );
                return;
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        info!("All requests drained, proceeding with shutdown");
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Decrements the in-flight counter even if the request future is dropped
struct InFlightGuard<'a>(&'a ShutdownState);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.request_completed();
    }
}

/// Request tracking middleware
pub async fn request_tracking_middleware(
    State(shutdown): State<Arc<ShutdownState>>,
    request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    if shutdown.is_draining() {
        return Err(BackendError::ServiceUnavailable(
            "Server is shutting down. Please retry your request.".to_string(),
        ));
    }

    shutdown.request_started();
    let _guard = InFlightGuard(&shutdown);

    Ok(next.run(request).await)
}

/// Resolves on Ctrl+C or SIGTERM, then drains in-flight requests
pub async fn graceful_shutdown(shutdown_state: Arc<ShutdownState>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }

    shutdown_state.start_drain();
    shutdown_state.wait_for_drain().await;
}
