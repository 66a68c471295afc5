//! CLI Module for the RemitLend backend
//!
//! Subcommands for:
//! - starting the server
//! - managing configuration
//! - health checking a running instance

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::VERSION;

/// RemitLend backend: simulation and score API server
#[derive(Parser, Debug)]
#[command(name = "remitlend-backend")]
#[command(version = VERSION)]
#[command(about = "RemitLend HTTP backend for the loan simulation and credit score APIs")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration file path (YAML, TOML, or JSON)
    #[arg(short, long, global = true, env = "REMITLEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Global log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true, env = "REMITLEND_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable JSON log output
    #[arg(long, global = true, env = "REMITLEND_JSON_LOGS")]
    pub json_logs: bool,

    /// Quiet mode - suppress banner and non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the backend server
    #[command(alias = "s")]
    Serve(ServeCommand),

    /// Configuration management
    #[command(alias = "cfg")]
    Config(ConfigCommand),

    /// Health check a running instance
    Health(HealthCommand),

    /// Show version information
    Version,
}

/// Start the backend server
///
/// Flags override values from the config file and environment.
#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Comma-separated list of allowed CORS origins
    #[arg(long)]
    pub allowed_origins: Option<String>,

    /// Disable the global rate limiter
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Do not serve /api/docs
    #[arg(long)]
    pub no_docs: bool,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Configuration management
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets are never printed)
    Show {
        /// Output format (yaml, toml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        file: PathBuf,
    },

    /// Initialize a new configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "remitlend-backend.yaml")]
        output: PathBuf,

        /// Configuration preset (standard, production)
        #[arg(short, long, default_value = "standard")]
        preset: String,

        /// Force overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show environment variable mappings
    Env,
}

/// Health check a running instance
#[derive(Parser, Debug)]
pub struct HealthCommand {
    /// Base URL of the backend instance
    #[arg(short, long, default_value = "http://localhost:3001")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value = "5")]
    pub timeout: u64,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Watch mode - continuously check health
    #[arg(short, long)]
    pub watch: bool,

    /// Watch interval in seconds
    #[arg(long, default_value = "5")]
    pub interval: u64,
}
