//! Configuration module for the RemitLend backend
//!
//! Configuration is layered:
//! - built-in defaults
//! - an optional YAML/TOML/JSON config file
//! - environment variables (`INTERNAL_API_KEY`, `CORS_ALLOWED_ORIGINS`, ...)
//! - CLI flags (applied by the `serve` command)
//!
//! The resulting [`BackendConfig`] is built once at startup and handed to
//! the components that need it.

pub mod security;

pub use security::{ApiKeyConfig, CorsConfig, RateLimitConfig, SecurityConfig, SharedSecret};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{BackendError, BackendResult};

/// Environment variable holding the shared secret for the access gate
pub const ENV_INTERNAL_API_KEY: &str = "INTERNAL_API_KEY";
/// Environment variable holding the comma-separated CORS origin list
pub const ENV_CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "HOST";
pub const ENV_RATE_LIMIT_PER_MINUTE: &str = "RATE_LIMIT_PER_MINUTE";
pub const ENV_RATE_LIMIT_BURST: &str = "RATE_LIMIT_BURST";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Access gate, CORS and rate limiting
    pub security: SecurityConfig,
    /// API documentation settings
    pub docs: DocsConfig,
    /// Telemetry settings
    pub telemetry: TelemetryConfig,
}

impl BackendConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> BackendResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BackendError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| BackendError::Config(format!("YAML parse error: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| BackendError::Config(format!("TOML parse error: {}", e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| BackendError::Config(format!("JSON parse error: {}", e)))?,
            _ => return Err(BackendError::Config(
                "Unsupported config file format. Use .yaml, .toml, or .json".to_string()
            )),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the default configuration with environment variable overrides
    pub fn from_env() -> BackendResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup.
    ///
    /// Taking the lookup as a closure keeps tests away from the process
    /// environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> BackendResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_INTERNAL_API_KEY) {
            self.security.api_key.internal_api_key = SharedSecret::new(key);
        }

        if let Some(origins) = lookup(ENV_CORS_ALLOWED_ORIGINS) {
            self.security.cors.allowed_origins = security::parse_origin_list(&origins);
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| {
                BackendError::Config(format!("Invalid port number: {}", port))
            })?;
        }

        if let Some(host) = lookup(ENV_HOST) {
            self.server.host = host;
        }

        if let Some(rpm) = lookup(ENV_RATE_LIMIT_PER_MINUTE) {
            self.security.rate_limiting.requests_per_minute = rpm.trim().parse().map_err(|_| {
                BackendError::Config(format!("Invalid {}: {}", ENV_RATE_LIMIT_PER_MINUTE, rpm))
            })?;
        }

        if let Some(burst) = lookup(ENV_RATE_LIMIT_BURST) {
            self.security.rate_limiting.burst_size = burst.trim().parse().map_err(|_| {
                BackendError::Config(format!("Invalid {}: {}", ENV_RATE_LIMIT_BURST, burst))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration.
    ///
    /// A missing `INTERNAL_API_KEY` is not a validation failure: the gate
    /// fails closed per request instead.
    pub fn validate(&self) -> BackendResult<()> {
        self.server.validate()?;
        self.security.validate().map_err(|message| BackendError::Validation {
            message,
            param: Some("security".to_string()),
        })?;
        Ok(())
    }

    /// Create a production-ready configuration
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.json_logs = true;
        config.server.request_logging = true;
        config
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// How long to wait for in-flight requests on shutdown
    #[serde(with = "duration_serde")]
    pub drain_timeout: Duration,
    /// Maximum accepted request body, in bytes
    pub body_limit_bytes: usize,
    /// Enable per-request logging
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
            request_timeout: Duration::from_secs(30),
            drain_timeout: Duration::from_secs(30),
            // express.json() default
            body_limit_bytes: 100 * 1024,
            request_logging: true,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> BackendResult<()> {
        if self.port == 0 {
            return Err(BackendError::Validation {
                message: "Port cannot be 0".to_string(),
                param: Some("server.port".to_string()),
            });
        }
        if self.body_limit_bytes == 0 {
            return Err(BackendError::Validation {
                message: "body_limit_bytes must be greater than 0".to_string(),
                param: Some("server.body_limit_bytes".to_string()),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(BackendError::Validation {
                message: "request_timeout must be greater than 0".to_string(),
                param: Some("server.request_timeout".to_string()),
            });
        }
        Ok(())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> BackendResult<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| BackendError::Config(format!("Invalid socket address: {}", e)))
    }
}

/// API documentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// Serve `/api/docs` and `/api/docs/openapi.json`
    pub enabled: bool,
    pub title: String,
    pub description: String,
    /// Version reported in the OpenAPI `info` block
    pub version: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "RemitLend API".to_string(),
            description: "Loan simulation and remittance credit score API".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Enable telemetry
    pub enabled: bool,
    /// Log level
    pub log_level: String,
    /// Enable JSON logging
    pub json_logs: bool,
    /// Service name reported in logs
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
            service_name: "remitlend-backend".to_string(),
        }
    }
}

/// Duration (de)serialization as `"30s"`, `"500ms"`, `"5m"` or bare seconds
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        // "ms" must be checked before "s" and "m"
        if let Some(millis) = s.strip_suffix("ms") {
            millis.trim().parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| format!("Invalid duration: {}", s))
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim().parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| format!("Invalid duration: {}", s))
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim().parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or_else(|| format!("Invalid duration: {}", s))
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| format!("Invalid duration: {}", s))
        }
    }
}
