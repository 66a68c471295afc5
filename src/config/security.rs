//! Security configuration for the RemitLend backend
//!
//! Provides configuration for:
//! - the shared-secret access gate
//! - CORS settings
//! - Rate limiting

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

use super::duration_serde;

/// Header carrying the shared secret on protected requests
pub const API_KEY_HEADER: &str = "x-api-key";

/// Security configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Shared-secret gate settings
    pub api_key: ApiKeyConfig,
    /// CORS settings
    pub cors: CorsConfig,
    /// Rate limiting settings
    pub rate_limiting: RateLimitConfig,
}

impl SecurityConfig {
    /// Validate the security configuration
    pub fn validate(&self) -> Result<(), String> {
        self.cors.validate()?;
        self.rate_limiting.validate()?;
        Ok(())
    }
}

/// The pre-shared secret protected endpoints are checked against.
///
/// `Debug` is redacted and the value is never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    /// Wrap a secret. Empty values count as "not configured".
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Access gate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyConfig {
    /// Expected value of the `x-api-key` header (from `INTERNAL_API_KEY`)
    #[serde(skip_serializing, deserialize_with = "deserialize_secret")]
    pub internal_api_key: Option<SharedSecret>,
}

impl ApiKeyConfig {
    pub fn is_configured(&self) -> bool {
        self.internal_api_key.is_some()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SharedSecret>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(SharedSecret::new))
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins allowed to make cross-origin requests.
    /// Empty means only requests without an `Origin` header are allowed.
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,
    /// Allowed request headers
    pub allowed_headers: Vec<String>,
    /// Allow credentials
    pub allow_credentials: bool,
    /// Max age for preflight cache (in seconds)
    pub max_age_seconds: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: true,
            max_age_seconds: None,
        }
    }
}

impl CorsConfig {
    /// Validate CORS configuration
    pub fn validate(&self) -> Result<(), String> {
        // Origins match exactly; there is no wildcard entry
        for origin in &self.allowed_origins {
            validate_origin(origin)?;
        }

        for method in &self.allowed_methods {
            if method.parse::<axum::http::Method>().is_err() {
                return Err(format!("Invalid CORS method: {}", method));
            }
        }

        for header in &self.allowed_headers {
            if header.parse::<axum::http::HeaderName>().is_err() {
                return Err(format!("Invalid CORS header name: {}", header));
            }
        }

        Ok(())
    }

    /// Check if a request origin is allowed.
    ///
    /// Requests without an `Origin` header (same-origin, curl, server to
    /// server) are always allowed.
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed == origin),
        }
    }
}

/// Split a comma-separated origin list, trimming whitespace and dropping
/// empty entries.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// An origin must be a bare `scheme://host[:port]`
fn validate_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| format!("Invalid CORS origin '{}': {}", origin, e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("CORS origin '{}' must use http or https", origin));
    }

    if url.origin().ascii_serialization() != origin {
        return Err(format!(
            "CORS origin '{}' must not contain a path, query or trailing slash",
            origin
        ));
    }

    Ok(())
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Sustained requests per minute per client
    pub requests_per_minute: u32,
    /// Maximum burst size (tokens in bucket)
    pub burst_size: u32,
    /// Clean up inactive buckets after this duration
    #[serde(with = "duration_serde")]
    pub bucket_ttl: Duration,
    /// How often to clean up expired buckets
    #[serde(with = "duration_serde")]
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 100,
            burst_size: 100,
            bucket_ttl: Duration::from_secs(900),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Validate rate limit configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.requests_per_minute == 0 {
            return Err("requests_per_minute cannot be 0".to_string());
        }
        if self.enabled && self.burst_size == 0 {
            return Err("burst_size cannot be 0".to_string());
        }
        if self.bucket_ttl.is_zero() {
            return Err("bucket_ttl must be greater than 0".to_string());
        }
        if self.cleanup_interval.is_zero() {
            return Err("cleanup_interval must be greater than 0".to_string());
        }
        Ok(())
    }
}
