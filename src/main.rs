//! GEM Advisor - motor controller configuration advisor
//!
//! Recommends controller function settings (F.1..F.25) for GEM low-speed
//! electric vehicles from owner priorities and driving conditions.
//!
//! # Usage
//!
//! ```bash
//! # Optimize a request read from stdin
//! echo '{"vehicleData":{"model":"e4"}}' | gem-advisor optimize
//!
//! # Serve the HTTP API
//! gem-advisor serve --addr 0.0.0.0:8080
//!
//! # Check a config file
//! gem-advisor check-config gem_advisor.toml
//! ```
//!
//! # Environment Variables
//!
//! - `GEM_ADVISOR_CONFIG`: Path to the TOML config file
//! - `GEM_ADVISOR_CORS_ORIGINS`: Comma-separated origins allowed by the API
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use gem_advisor::api::{create_app, ApiState};
use gem_advisor::config::{validation, AdvisorConfig};
use gem_advisor::optimization::RuleBasedOptimizer;
use gem_advisor::types::OptimizationRequest;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "gem-advisor")]
#[command(about = "Motor controller configuration advisor for GEM low-speed EVs")]
#[command(version)]
struct CliArgs {
    /// Config file (default: $GEM_ADVISOR_CONFIG, then ./gem_advisor.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Optimize one request and print the result as JSON
    Optimize {
        /// JSON request file; reads stdin when absent
        #[arg(long, value_name = "FILE")]
        request: Option<PathBuf>,
    },

    /// Serve the HTTP API
    Serve {
        /// Override the configured bind address
        #[arg(short, long, value_name = "HOST:PORT")]
        addr: Option<String>,
    },

    /// List registered vehicle models
    Vehicles,

    /// Print the strategy adjustment tables as JSON
    Strategies,

    /// Validate a config file and report warnings
    CheckConfig {
        /// File to check (default: the file the search order would load)
        file: Option<PathBuf>,
    },
}

// ============================================================================
// Commands
// ============================================================================

fn load_config(explicit: Option<&Path>) -> Result<AdvisorConfig> {
    match explicit {
        Some(path) => AdvisorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AdvisorConfig::load()),
    }
}

fn build_optimizer(config: &AdvisorConfig) -> Result<RuleBasedOptimizer> {
    RuleBasedOptimizer::from_config(config).context("Failed to build optimizer from config")
}

fn cmd_optimize(config: &AdvisorConfig, request_path: Option<&Path>) -> Result<()> {
    let raw = match request_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    let request: OptimizationRequest =
        serde_json::from_str(&raw).context("Request is not a valid optimization request")?;

    let optimizer = build_optimizer(config)?;
    let result = optimizer.optimize(&request);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize result")?
    );
    Ok(())
}

async fn cmd_serve(config: &AdvisorConfig, addr: Option<String>) -> Result<()> {
    let optimizer = Arc::new(build_optimizer(config)?);
    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());

    let app = create_app(ApiState::new(optimizer));
    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;

    info!(addr = %server_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("HTTP server failed")?;

    info!("GEM Advisor shutdown complete");
    Ok(())
}

fn cmd_vehicles(config: &AdvisorConfig) -> Result<()> {
    let optimizer = build_optimizer(config)?;
    let registry = optimizer.registry();
    for model in registry.models() {
        let marker = if model == registry.fallback_model() {
            " (fallback)"
        } else {
            ""
        };
        let name = registry.find(model).map_or("", |p| p.name.as_str());
        println!("{model:<10} {name}{marker}");
    }
    Ok(())
}

fn cmd_strategies(config: &AdvisorConfig) -> Result<()> {
    let optimizer = build_optimizer(config)?;
    println!(
        "{}",
        serde_json::to_string_pretty(optimizer.rules().strategies())
            .context("Failed to serialize strategies")?
    );
    Ok(())
}

fn cmd_check_config(file: Option<PathBuf>) -> Result<()> {
    let Some(path) = file.or_else(AdvisorConfig::locate) else {
        println!("No config file found; built-in defaults are in effect.");
        return Ok(());
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let unknown = validation::validate_unknown_keys(&contents);
    let config: AdvisorConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let warnings = config
        .validate()
        .with_context(|| format!("{} is invalid", path.display()))?;

    for w in unknown.iter().chain(warnings.iter()) {
        println!("warning: {w}");
    }
    println!(
        "{}: OK ({} custom vehicle(s), {} warning(s))",
        path.display(),
        config.vehicles.len(),
        unknown.len() + warnings.len()
    );
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    match args.command {
        SubCommand::CheckConfig { file } => cmd_check_config(file.or(args.config)),
        command => {
            let config = load_config(args.config.as_deref())?;
            run(command, &config).await
        }
    }
}

async fn run(command: SubCommand, config: &AdvisorConfig) -> Result<()> {
    match command {
        SubCommand::Optimize { request } => cmd_optimize(config, request.as_deref()),
        SubCommand::Serve { addr } => cmd_serve(config, addr).await,
        SubCommand::Vehicles => cmd_vehicles(config),
        SubCommand::Strategies => cmd_strategies(config),
        SubCommand::CheckConfig { file } => cmd_check_config(file),
    }
}
