//! devsvcd - Device Service Daemon
//!
//! Serves the device service REST surface in front of the in-memory
//! virtual driver.
//!
//! Usage:
//!   devsvcd [--config <file>] [--profiles-dir <dir>] [--port <port>]
//!
//! Without a config file, defaults apply and profiles are read from
//! `res/profiles`.

mod collaborators;
mod config;
mod driver;
mod provision;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use devsvc_api::{create_router, AppState};
use devsvc_cache::EntityCaches;
use devsvc_runtime::{DeviceService, RetryingEventSink};

use crate::collaborators::{LoggingEventSink, LoggingMetadataClient};
use crate::config::{Config, LogFormat, LoggingConfig};
use crate::driver::VirtualDriver;

#[derive(Parser)]
#[command(name = "devsvcd")]
#[command(author, version, about = "Device service daemon")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "DEVSVC_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of device profile YAML files (overrides config)
    #[arg(short, long)]
    profiles_dir: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(long)]
    port: Option<u16>,
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    match logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };
    if let Some(dir) = cli.profiles_dir {
        config.device.profiles_dir = dir;
    }
    if let Some(port) = cli.port {
        config.service.port = port;
    }

    init_logging(&config.logging);
    tracing::info!(service = %config.service.name, "Starting devsvcd");

    // Provision caches
    let profiles = provision::load_profiles(&config.device.profiles_dir)?;
    let snapshot = provision::build_snapshot(profiles, &config.device_list);
    let caches = EntityCaches::from_snapshot(snapshot).context("Invalid provisioning")?;
    tracing::info!(
        profiles = caches.profiles.len(),
        devices = caches.devices.len(),
        value_descriptors = caches.value_descriptors.len(),
        "Caches provisioned"
    );

    let driver = Arc::new(VirtualDriver::new());
    let sink = RetryingEventSink::new(
        LoggingEventSink,
        config.sink.max_retries,
        config.sink.retry_delay(),
    );
    let service = Arc::new(DeviceService::new(
        config.service.name.clone(),
        caches,
        driver.clone(),
        Arc::new(sink),
        Arc::new(LoggingMetadataClient),
        config.settings(),
    ));
    service.start().await?;

    let pusher = (config.service.enable_async_readings && config.driver.push_interval_ms > 0)
        .then(|| {
            let driver = driver.clone();
            let period = Duration::from_millis(config.driver.push_interval_ms);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    if let Err(e) = driver.push_stored().await {
                        tracing::warn!(error = %e, "Async push stopped");
                        break;
                    }
                }
            })
        });

    let app = create_router(AppState::new(service.clone()));
    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.service.host))?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pusher) = pusher {
        pusher.abort();
    }
    service.stop(false).await?;
    tracing::info!("devsvcd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
