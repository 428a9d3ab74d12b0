//! Configuration file loading
//!
//! The TOML file is the lowest-priority configuration source. Command-line
//! arguments and environment variables are layered on top of it by the
//! binary (see `tripgen::config`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the per-user configuration directory
const CONFIG_DIR_NAME: &str = "tripgen";

/// Name of the configuration file inside the configuration directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is not set (e.g. "info", "tripgen=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contents of `config.toml`
///
/// Every field is optional so that a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to the CSV file of photo records
    pub csv_path: Option<PathBuf>,
    /// Reverse geocoding API key
    pub api_key: Option<String>,
    /// Number of enrichment workers
    pub pool_size: Option<usize>,
    /// Outbound geocoding request ceiling (requests per second)
    pub rate_limit_per_second: Option<u32>,
    /// Override for the geocoding endpoint
    pub geocode_base_url: Option<String>,
    /// Per-request timeout for geocoding calls
    pub request_timeout_secs: Option<u64>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Platform configuration file location, e.g. `~/.config/tripgen/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the TOML configuration file.
///
/// A missing file is not an error: a warning is logged and defaults are
/// returned. A file that exists but cannot be read or parsed is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    debug!(path = %path.display(), "Config file loaded");
    Ok(config)
}
