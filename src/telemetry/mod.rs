//! Telemetry module
//!
//! Structured logging with `tracing`: compact human-readable output for
//! development, JSON for production. `RUST_LOG` overrides the configured
//! level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::TelemetryConfig;
use crate::error::{BackendError, BackendResult};

/// Initialize the telemetry subsystem
pub fn init_telemetry(config: &TelemetryConfig) -> BackendResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| BackendError::Config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    let subscriber = tracing_subscriber::registry()
        .with(env_filter);

    let result = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true);

        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_target(true)
            .compact();

        subscriber.with(fmt_layer).try_init()
    };

    result.map_err(|e| BackendError::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        version = %env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}
