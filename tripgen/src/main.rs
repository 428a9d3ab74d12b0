//! tripgen - trip titles from geotagged photos
//!
//! Reads a CSV of `timestamp,latitude,longitude` photo records, resolves
//! each photo to place names through the reverse geocoding API, groups the
//! photos into visits per place and prints story titles for every visit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripgen::config::{AppConfig, CliOverrides};
use tripgen::services::RecordSource;
use tripgen::TripPipeline;
use tripgen_common::config::{default_config_path, load_toml_config};

/// Command-line arguments for tripgen
#[derive(Parser, Debug)]
#[command(name = "tripgen")]
#[command(about = "Generate trip titles from geotagged photo records")]
#[command(version)]
struct Args {
    /// Path to CSV of photo records
    #[arg(long, alias = "csvPath", env = "TRIPGEN_CSV_PATH")]
    csv_path: Option<PathBuf>,

    /// API key for the reverse geocoding API
    #[arg(long, alias = "apiKey", env = "TRIPGEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Number of concurrent enrichment workers
    #[arg(long, env = "TRIPGEN_POOL_SIZE")]
    pool_size: Option<usize>,

    /// Maximum geocoding requests per second
    #[arg(long, env = "TRIPGEN_RATE_LIMIT")]
    rate_limit: Option<u32>,

    /// TOML configuration file
    #[arg(long, env = "TRIPGEN_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            csv_path: self.csv_path.clone(),
            api_key: self.api_key.clone(),
            pool_size: self.pool_size,
            rate_limit_per_second: self.rate_limit,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // TOML is read before tracing starts so that it can set the log level
    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load config file")?,
        None => Default::default(),
    };

    // Logs go to stderr; stdout carries the titles
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting tripgen");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file not found: {}, using defaults", path.display()),
        None => warn!("No config directory available, using defaults"),
    }

    let config = AppConfig::resolve(&args.overrides(), &toml_config)
        .context("Invalid configuration")?;
    info!(
        csv_path = %config.csv_path.display(),
        pool_size = config.pool_size,
        rate_limit = config.rate_limit_per_second,
        "Configuration resolved"
    );

    // Fatal before any enrichment starts
    let source = RecordSource::open(&config.csv_path)
        .with_context(|| format!("Failed to open {}", config.csv_path.display()))?;

    let pipeline = TripPipeline::from_config(&config)
        .context("Failed to create geocoding client")?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, cancelling");
        signal_token.cancel();
    });

    let outcome = pipeline
        .run(source, cancel)
        .await
        .context("Pipeline failed")?;

    for trip in outcome.titles() {
        for title in &trip.titles {
            println!("{}", title);
        }
    }

    if outcome.cancelled() {
        warn!("Run was cancelled, titles cover only records enriched before shutdown");
    }

    info!("tripgen complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
