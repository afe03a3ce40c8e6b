//! Configuration file support for progtrack.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/progtrack/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// Training schedule shape used by aggregation and reporting
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Training days walked per week (days 1..=N)
    #[serde(default = "default_days_per_week")]
    pub days_per_week: u32,

    /// Days in one month window of the progress bar
    #[serde(default = "default_days_per_month")]
    pub days_per_month: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            days_per_week: default_days_per_week(),
            days_per_month: default_days_per_month(),
        }
    }
}

/// Where exported completion rows live
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_rows_dir")]
    pub rows_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            rows_dir: default_rows_dir(),
        }
    }
}

// Default value functions
fn default_days_per_week() -> u32 {
    5
}

fn default_days_per_month() -> u32 {
    20
}

fn default_rows_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("progtrack").join("rows")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("progtrack").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Both schedule values must be non-zero
    pub fn validate(&self) -> Result<()> {
        if self.schedule.days_per_week == 0 {
            return Err(Error::Config("schedule.days_per_week must be > 0".into()));
        }
        if self.schedule.days_per_month == 0 {
            return Err(Error::Config("schedule.days_per_month must be > 0".into()));
        }
        Ok(())
    }
}
