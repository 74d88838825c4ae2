//! Configuration loading
//!
//! Resolution order for the config file:
//! 1. Explicit path (command-line argument)
//! 2. `EVHUB_CONFIG` environment variable
//! 3. `<config_dir>/evhub/config.toml`
//!
//! A missing file is not an error: defaults are used and a warning is logged.
//! Individual values can then be overridden from the environment.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const ENV_CONFIG_PATH: &str = "EVHUB_CONFIG";
/// Environment override for the catalog API key
pub const ENV_CATALOG_API_KEY: &str = "EVHUB_CATALOG_API_KEY";
/// Environment override for the catalog base URL
pub const ENV_CATALOG_URL: &str = "EVHUB_CATALOG_URL";
/// Environment override for the local database path
pub const ENV_DATABASE: &str = "EVHUB_DATABASE";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Remote catalog settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog search endpoint
    pub base_url: String,
    /// API key; absent or blank means the remote source is skipped
    pub api_key: Option<String>,
    /// City used as the location query
    pub default_city: String,
    /// Maximum number of results requested per fetch
    pub page_size: u32,
    /// Fetch timeout when external aggregation is not requested
    pub fetch_timeout_ms: u64,
    /// Fetch timeout when external aggregation is requested
    pub external_fetch_timeout_ms: u64,
    /// Minimum spacing between consecutive catalog requests
    pub min_request_interval_ms: u64,
    /// Ask the catalog to include third-party aggregated results
    pub include_external: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.ticketmaster.com/discovery/v2/events.json".to_string(),
            api_key: None,
            default_city: "Paris".to_string(),
            page_size: 50,
            fetch_timeout_ms: 8_000,
            external_fetch_timeout_ms: 20_000,
            min_request_interval_ms: 250,
            include_external: true,
        }
    }
}

impl CatalogConfig {
    /// API key if configured and non-blank
    pub fn valid_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| is_valid_key(key))
    }
}

/// Local event store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Feed pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Local records whose importer marker contains this string are dropped
    pub legacy_source_marker: String,
    /// Minimum interval between repeated warnings with the same key
    pub warn_interval_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            legacy_source_marker: "eventbrite".to_string(),
            warn_interval_ms: 60_000,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (`RUST_LOG` takes precedence)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Find the config file to load, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("evhub").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration from `path` and apply environment overrides
///
/// A missing file degrades to defaults. A file that exists but does not parse
/// is a configuration error.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match path {
        Some(path) if path.exists() => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
            let parsed: TomlConfig = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
            info!("Configuration loaded from {}", path.display());
            parsed
        }
        Some(path) => {
            warn!("Config file {} not found, using defaults", path.display());
            TomlConfig::default()
        }
        None => {
            info!("No config file found, using defaults");
            TomlConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Environment variables take priority over values from the TOML file
pub fn apply_env_overrides(config: &mut TomlConfig) {
    if let Ok(key) = std::env::var(ENV_CATALOG_API_KEY) {
        if is_valid_key(&key) {
            if config.catalog.valid_api_key().is_some() {
                warn!("Catalog API key found in both TOML and environment; using environment");
            }
            config.catalog.api_key = Some(key);
        }
    }

    if let Ok(url) = std::env::var(ENV_CATALOG_URL) {
        if !url.trim().is_empty() {
            config.catalog.base_url = url;
        }
    }

    if let Ok(path) = std::env::var(ENV_DATABASE) {
        if !path.trim().is_empty() {
            config.store.database_path = PathBuf::from(path);
        }
    }
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("evhub"))
        .unwrap_or_else(|| PathBuf::from("./evhub_data"))
        .join("evhub.db")
}
