//! Configuration resolution for tripgen
//!
//! Multi-tier resolution with CLI → ENV → TOML → default priority. The CLI
//! and ENV tiers are merged by clap before they reach [`CliOverrides`].

use crate::services::geocoding_client::{
    GeocoderConfig, DEFAULT_RATE_LIMIT_PER_SECOND, DEFAULT_TIMEOUT_SECS, GOOGLE_GEOCODE_URL,
};
use crate::services::enrichment_pool::DEFAULT_POOL_SIZE;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tripgen_common::config::TomlConfig;
use tripgen_common::{Error, Result};

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub csv_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub pool_size: Option<usize>,
    pub rate_limit_per_second: Option<u32>,
}

/// Fully resolved settings for one run
#[derive(Clone)]
pub struct AppConfig {
    pub csv_path: PathBuf,
    pub api_key: String,
    pub pool_size: usize,
    pub rate_limit_per_second: u32,
    pub geocode_base_url: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("csv_path", &self.csv_path)
            .field("api_key", &"<redacted>")
            .field("pool_size", &self.pool_size)
            .field("rate_limit_per_second", &self.rate_limit_per_second)
            .field("geocode_base_url", &self.geocode_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl AppConfig {
    /// Merge command-line/environment values over the TOML file and defaults
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let csv_path = cli
            .csv_path
            .clone()
            .or_else(|| toml.csv_path.clone())
            .ok_or_else(|| {
                Error::Config(
                    "CSV path not configured. Please configure using one of:\n\
                     1. Command line: --csv-path photos.csv\n\
                     2. Environment: TRIPGEN_CSV_PATH=photos.csv\n\
                     3. TOML config: csv_path = \"photos.csv\""
                        .to_string(),
                )
            })?;

        let api_key = resolve_api_key(cli, toml)?;

        let pool_size = cli
            .pool_size
            .or(toml.pool_size)
            .unwrap_or(DEFAULT_POOL_SIZE);
        if pool_size == 0 {
            return Err(Error::Config("pool_size must be at least 1".to_string()));
        }

        let rate_limit_per_second = cli
            .rate_limit_per_second
            .or(toml.rate_limit_per_second)
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_SECOND);
        if rate_limit_per_second == 0 {
            return Err(Error::Config(
                "rate_limit_per_second must be at least 1".to_string(),
            ));
        }

        let geocode_base_url = toml
            .geocode_base_url
            .clone()
            .unwrap_or_else(|| GOOGLE_GEOCODE_URL.to_string());

        let request_timeout =
            Duration::from_secs(toml.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            csv_path,
            api_key,
            pool_size,
            rate_limit_per_second,
            geocode_base_url,
            request_timeout,
        })
    }

    pub fn geocoder_config(&self) -> GeocoderConfig {
        GeocoderConfig {
            api_key: self.api_key.clone(),
            base_url: self.geocode_base_url.clone(),
            rate_limit_per_second: self.rate_limit_per_second,
            timeout: self.request_timeout,
        }
    }
}

/// API key: CLI/ENV first, then TOML
fn resolve_api_key(cli: &CliOverrides, toml: &TomlConfig) -> Result<String> {
    let cli_key = cli.api_key.as_deref().filter(|k| is_valid_key(k));
    let toml_key = toml.api_key.as_deref().filter(|k| is_valid_key(k));

    if cli_key.is_some() && toml_key.is_some() {
        warn!(
            "API key found on command line/environment and in TOML. \
             Using command line/environment."
        );
    }

    if let Some(key) = cli_key {
        info!("API key loaded from command line/environment");
        return Ok(key.to_string());
    }

    if let Some(key) = toml_key {
        info!("API key loaded from TOML config");
        return Ok(key.to_string());
    }

    Err(Error::Config(
        "Geocoding API key not configured. Please configure using one of:\n\
         1. Command line: --api-key your-key-here\n\
         2. Environment: TRIPGEN_API_KEY=your-key-here\n\
         3. TOML config: api_key = \"your-key\""
            .to_string(),
    ))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
