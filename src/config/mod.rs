//! # Configuration Management Module
//!
//! Loads and writes the TOML file that seeds a pet and the logging setup of
//! the `tamapet` binary.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tamapet::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Create default configuration
//!     Config::create_default("config.toml").await?;
//!
//!     // Load configuration from file
//!     let config = Config::load("config.toml").await?;
//!     println!("Pet name: {}", config.pet.name);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [pet]
//! name = "Beestje"
//! tick_interval_ms = 1000
//! # seed = 42
//!
//! [logging]
//! level = "info"
//! # file = "tamapet.log"
//! ```
//!
//! Every section and key is optional; missing values fall back to defaults.
//! CLI args override the file: CLI args > Config file > Defaults

use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::pet::PetError;

/// Name given to a pet when nobody picks one.
pub const DEFAULT_PET_NAME: &str = "Beestje";

/// Nominal scheduler period.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pet: PetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetConfig {
    #[serde(default = "default_pet_name")]
    pub name: String,
    /// Scheduler period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Fixed seed for the decay draws. Unset means seeded from OS entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_pet_name() -> String {
    DEFAULT_PET_NAME.to_string()
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            name: default_pet_name(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            seed: None,
        }
    }
}

impl PetConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_tick_interval(mut self, period: Duration) -> Self {
        self.tick_interval_ms = period.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Scheduler period, never shorter than one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<(), PetError> {
        if self.tick_interval_ms == 0 {
            return Err(PetError::InvalidConfig(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parse `level` ("error", "warn", "info", "debug", "trace", "off").
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow!("Unknown logging level '{}'", self.level))
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.pet.validate()?;
        self.logging.level_filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.pet, PetConfig::default());
        assert_eq!(cfg.pet.name, "Beestje");
        assert_eq!(cfg.pet.tick_interval(), Duration::from_secs(1));
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_interval_rejected() {
        let cfg: Config = toml::from_str("[pet]\ntick_interval_ms = 0\n").unwrap();
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.pet.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn bad_level_rejected() {
        let cfg: Config = toml::from_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(cfg.validate().is_err());
    }
}
