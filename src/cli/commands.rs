//! CLI Command Implementations

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::config::{self, BackendConfig};
use crate::error::BackendResult;
use crate::server::ApiMounts;
use crate::VERSION;

use super::{Cli, Commands, ConfigAction, ConfigCommand, HealthCommand, ServeCommand};

/// Execute the CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_global_overrides(&cli, &mut config);

    match cli.command {
        Commands::Serve(cmd) => execute_serve(cmd, config, cli.quiet).await,
        Commands::Config(cmd) => execute_config(cmd, config),
        Commands::Health(cmd) => execute_health(cmd).await,
        Commands::Version => execute_version(),
    }
}

/// Defaults, then the optional config file, then environment variables
pub fn load_config(path: Option<&Path>) -> BackendResult<BackendConfig> {
    match path {
        Some(path) => {
            let mut config = BackendConfig::from_file(path)?;
            config.apply_env_overrides(|name| std::env::var(name).ok())?;
            config.validate()?;
            Ok(config)
        }
        None => BackendConfig::from_env(),
    }
}

/// Apply global flags; unset flags keep the file and environment values
pub fn apply_global_overrides(cli: &Cli, config: &mut BackendConfig) {
    if let Some(level) = &cli.log_level {
        config.telemetry.log_level = level.clone();
    }

    if cli.json_logs {
        config.telemetry.json_logs = true;
    }
}

/// Apply `serve` flags on top of the loaded configuration
pub fn apply_serve_overrides(cmd: &ServeCommand, config: &mut BackendConfig) {
    if let Some(port) = cmd.port {
        config.server.port = port;
    }

    if let Some(host) = &cmd.host {
        config.server.host = host.clone();
    }

    if let Some(origins) = &cmd.allowed_origins {
        config.security.cors.allowed_origins = config::security::parse_origin_list(origins);
    }

    if cmd.no_rate_limit {
        config.security.rate_limiting.enabled = false;
    }

    if cmd.no_docs {
        config.docs.enabled = false;
    }

    if let Some(timeout) = cmd.timeout {
        config.server.request_timeout = Duration::from_secs(timeout);
    }
}

/// Execute the serve command
async fn execute_serve(cmd: ServeCommand, mut config: BackendConfig, quiet: bool) -> Result<()> {
    apply_serve_overrides(&cmd, &mut config);

    config.validate().context("Configuration validation failed")?;

    if !quiet {
        print_banner(&config);
    }

    crate::run_server(config, ApiMounts::new()).await
}

/// Execute the config command
fn execute_config(cmd: ConfigCommand, config: BackendConfig) -> Result<()> {
    match cmd.action {
        ConfigAction::Show { format } => {
            let output = match format.as_str() {
                "toml" => toml::to_string_pretty(&config)?,
                "json" => serde_json::to_string_pretty(&config)?,
                _ => serde_yaml::to_string(&config)?,
            };
            println!("{}", output);
            println!(
                "# INTERNAL_API_KEY: {}",
                if config.security.api_key.is_configured() { "set" } else { "NOT SET" }
            );
            Ok(())
        }

        ConfigAction::Validate { file } => {
            let config = BackendConfig::from_file(&file)?;
            println!("Configuration at {:?} is valid", file);
            println!("  Listen:        {}:{}", config.server.host, config.server.port);
            println!("  CORS origins:  {}", config.security.cors.allowed_origins.len());
            println!("  Rate limiting: {}", if config.security.rate_limiting.enabled { "enabled" } else { "disabled" });
            println!("  API docs:      {}", if config.docs.enabled { "enabled" } else { "disabled" });
            Ok(())
        }

        ConfigAction::Init { output, preset, force } => {
            if output.exists() && !force {
                bail!("File {:?} already exists. Use --force to overwrite.", output);
            }

            let config = match preset.as_str() {
                "production" => BackendConfig::production(),
                _ => BackendConfig::default(),
            };

            let yaml = serde_yaml::to_string(&config)?;
            std::fs::write(&output, &yaml)
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!("Created configuration file: {:?}", output);
            println!("Preset: {}", preset);
            println!("Set {} in the environment; it is never written to config files.", config::ENV_INTERNAL_API_KEY);
            Ok(())
        }

        ConfigAction::Env => {
            println!("Environment Variable Mappings:");
            println!();
            for (name, description) in env_mappings() {
                println!("  {:<28} {}", name, description);
            }
            Ok(())
        }
    }
}

/// Recognised environment variables and what they control
pub fn env_mappings() -> Vec<(&'static str, &'static str)> {
    vec![
        (config::ENV_INTERNAL_API_KEY, "Shared secret required in x-api-key on protected routes"),
        (config::ENV_CORS_ALLOWED_ORIGINS, "Comma-separated list of allowed CORS origins"),
        (config::ENV_PORT, "Server port (default: 3001)"),
        (config::ENV_HOST, "Server host (default: 0.0.0.0)"),
        (config::ENV_RATE_LIMIT_PER_MINUTE, "Sustained requests per minute per client"),
        (config::ENV_RATE_LIMIT_BURST, "Burst size per client"),
        ("REMITLEND_CONFIG", "Configuration file path"),
        ("REMITLEND_LOG_LEVEL", "Log level (trace/debug/info/warn/error)"),
        ("REMITLEND_JSON_LOGS", "Enable JSON log format"),
        ("RUST_LOG", "Log filter override"),
    ]
}

/// Execute the health command
async fn execute_health(cmd: HealthCommand) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cmd.timeout))
        .build()?;

    let url = format!("{}/health", cmd.url.trim_end_matches('/'));

    loop {
        let start = Instant::now();

        match client.get(&url).send().await {
            Ok(response) => {
                let latency = start.elapsed();
                let status = response.status();
                let body: serde_json::Value = response.json().await.unwrap_or_default();

                match cmd.format.as_str() {
                    "json" => {
                        let result = serde_json::json!({
                            "url": url,
                            "status": status.as_u16(),
                            "latency_ms": latency.as_millis(),
                            "response": body,
                        });
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    }
                    _ => {
                        let marker = if status.is_success() { "✓" } else { "✗" };
                        println!("{} {} - Status: {} - Latency: {:?}",
                            marker, url, status.as_u16(), latency);
                        if let Some(uptime) = body.get("uptime").and_then(|u| u.as_f64()) {
                            println!("  Uptime: {:.1}s", uptime);
                        }
                    }
                }

                if !cmd.watch {
                    return if status.is_success() { Ok(()) } else {
                        bail!("Health check failed with status {}", status)
                    };
                }
            }
            Err(e) => {
                match cmd.format.as_str() {
                    "json" => {
                        let result = serde_json::json!({
                            "url": url,
                            "error": e.to_string(),
                        });
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    }
                    _ => println!("✗ {} - Error: {}", url, e),
                }

                if !cmd.watch {
                    bail!("Health check failed: {}", e);
                }
            }
        }

        tokio::time::sleep(Duration::from_secs(cmd.interval)).await;
    }
}

/// Execute the version command
fn execute_version() -> Result<()> {
    println!("remitlend-backend {}", VERSION);
    Ok(())
}

fn print_banner(config: &BackendConfig) {
    let base = format!("http://{}:{}", config.server.host, config.server.port);

    println!();
    println!("RemitLend Backend v{}", VERSION);
    println!();
    println!("Configuration:");
    println!("  • Server:        {}:{}", config.server.host, config.server.port);
    println!("  • API key gate:  {}", if config.security.api_key.is_configured() { "configured" } else { "NOT CONFIGURED (protected routes return 500)" });
    println!("  • CORS origins:  {}", if config.security.cors.allowed_origins.is_empty() {
        "none".to_string()
    } else {
        config.security.cors.allowed_origins.join(", ")
    });
    println!("  • Rate limiting: {}", if config.security.rate_limiting.enabled { "enabled" } else { "disabled" });
    println!();
    println!("Endpoints:");
    println!("  • Health:        {}/health", base);
    println!("  • Simulation:    {}/api", base);
    println!("  • Score:         {}/api/score", base);
    if config.docs.enabled {
        println!("  • Docs:          {}/api/docs", base);
    }
    println!();
}
