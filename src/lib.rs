//! # RemitLend Backend
//!
//! HTTP front door for the RemitLend loan simulation and credit score APIs.
//!
//! The backend owns the cross-cutting concerns and leaves the business
//! endpoints to the sub-APIs it mounts:
//!
//! - **Access gate**: a shared `x-api-key` secret guards score-mutating routes
//! - **CORS**: an explicit allowlist read from `CORS_ALLOWED_ORIGINS`
//! - **Rate limiting**: per-client token buckets in front of every route
//! - **Health**: `/` and `/health` for liveness probes
//! - **API docs**: OpenAPI document and Swagger UI at `/api/docs`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use remitlend_backend::{ApiMounts, BackendConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BackendConfig::from_env()?;
//!     run_server(config, ApiMounts::new()).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod security;
pub mod server;
pub mod telemetry;

pub use config::BackendConfig;
pub use error::{BackendError, BackendResult};
pub use server::{run_server, ApiMounts};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port
pub const DEFAULT_PORT: u16 = 3001;
