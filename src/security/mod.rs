//! Security module for the RemitLend backend
//!
//! Provides:
//! - the shared-secret access gate (`x-api-key`)
//! - CORS policy and origin guard
//! - token bucket rate limiting

mod api_key;
mod cors;
mod rate_limit;
mod middleware;

pub use api_key::*;
pub use cors::*;
pub use rate_limit::*;
pub use middleware::*;
