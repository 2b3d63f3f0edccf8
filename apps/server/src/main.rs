//! Onkyo Server - HTTP API for Onkyo/Integra receivers.
//!
//! Holds one eISCP session to the configured receiver and exposes power,
//! volume, subwoofer, input and profile control as JSON over HTTP.

mod config;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use onkyo_core::{bootstrap_services, start_server, AppState};
use tokio::signal;

use crate::config::ServerConfig;

/// Onkyo Server - HTTP control API for an Onkyo receiver.
#[derive(Parser, Debug)]
#[command(name = "onkyo-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "ONKYO_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Receiver host (overrides config file).
    #[arg(long, env = "ONKYO_HOST")]
    host: Option<String>,

    /// Receiver eISCP port (overrides config file).
    #[arg(long, env = "ONKYO_PORT")]
    port: Option<u16>,

    /// HTTP bind port (overrides config file).
    #[arg(short = 'p', long, env = "ONKYO_BIND_PORT")]
    bind_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Onkyo Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(port) = args.bind_port {
        config.bind_port = port;
    }

    let core_config = config.to_core_config();
    core_config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    log::info!(
        "Configuration: receiver={}:{}, bind_port={}, profiles={}",
        core_config.host,
        core_config.port,
        core_config.bind_port,
        core_config.profiles.len()
    );

    let services = bootstrap_services(&core_config)
        .await
        .with_context(|| format!("Failed to connect to receiver at {}", core_config.host))?;

    log::info!("Connected to receiver at {}", services.session.addr());

    let app_state = AppState::from_services(&services, core_config);
    let result = start_server(app_state, shutdown_signal()).await;

    log::info!("Shutdown signal received, cleaning up...");
    services.shutdown().await;

    result.context("HTTP server failed")?;
    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
