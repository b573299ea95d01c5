use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::core::fund::FundKind;

pub const DEFAULT_UPSTREAM_URL: &str = "https://fundturkey.com.tr";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Widest date range sent in a single upstream request
    pub chunk_days: i64,
    pub retries: usize,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            chunk_days: 90,
            retries: 2,
            retry_delay_ms: 500,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Disk,
    Memory,
    None,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: Option<String>,
}

/// Thresholds deciding whether cached history can be served as is.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct FreshnessConfig {
    /// Share of expected trading days the cache must hold
    pub coverage_ratio: f64,
    /// Allowed gap between the requested start and the earliest cached day
    pub range_tolerance_days: i64,
    /// Allowed age of the latest cached day
    pub max_age_days: i64,
    /// Trading days per calendar day
    pub trading_day_ratio: f64,
    /// Discount for public holidays
    pub holiday_factor: f64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        FreshnessConfig {
            coverage_ratio: 0.8,
            range_tolerance_days: 7,
            max_age_days: 2,
            trading_day_ratio: 5.0 / 7.0,
            holiday_factor: 0.95,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RequestDefaults {
    pub kind: FundKind,
    pub days: i64,
    /// Upper bound for `days` on any request
    pub max_days: i64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        RequestDefaults {
            kind: FundKind::Yat,
            days: 365 * 5,
            max_days: 365 * 20,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub freshness: FreshnessConfig,
    #[serde(default)]
    pub defaults: RequestDefaults,
}

impl AppConfig {
    /// Loads the default config file, falling back to built-in defaults when
    /// none has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("tr", "fundview", "fundview")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.store.path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("tr", "fundview", "fundview")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("cache"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
