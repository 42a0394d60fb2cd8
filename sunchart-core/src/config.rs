//! TOML configuration for the provider, worker pool, geocoder and output.
//!
//! Every field has a default, so an empty or partial file is valid.

use crate::endpoint::DEFAULT_BASE_URL;
use crate::pool::{FailurePolicy, DEFAULT_WORKERS};
use crate::provider::SolarEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Nominatim search endpoint.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

/// User agent the geocoder identifies itself with.
pub const DEFAULT_GEOCODER_USER_AGENT: &str = "city_addr_locator_app";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunchartConfig {
    pub provider: ProviderConfig,
    pub pool: PoolConfig,
    pub geocoder: GeocoderConfig,
    pub output: OutputConfig,
}

/// Sunrise/sunset API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub formatted: u8,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            formatted: 0,
            timeout_secs: 30,
            user_agent: concat!("sunchart/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Concurrency settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            failure_policy: FailurePolicy::Strict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub event: SolarEvent,
    /// How often a waiting caller reports that the run is still in progress.
    pub poll_interval_secs: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            event: SolarEvent::Sunrise,
            poll_interval_secs: 5,
        }
    }
}

impl OutputConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl SunchartConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.workers == 0 {
            return Err(ConfigError::Invalid("pool.workers must be at least 1".into()));
        }
        if self.provider.formatted > 1 {
            return Err(ConfigError::Invalid(format!(
                "provider.formatted must be 0 or 1, got {}",
                self.provider.formatted
            )));
        }
        if self.provider.timeout_secs == 0 || self.geocoder.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".into()));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".into()));
        }
        Ok(())
    }
}
