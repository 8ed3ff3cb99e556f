//! Application configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    /// Durations offered as one-click presets, in seconds
    pub popular: Vec<u64>,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    pub tick_interval_ms: u64,
    /// Start the next timer in the list when one finishes
    pub auto_advance: bool,
    pub log_level: String,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.popular.contains(&0) {
            return Err(Error::Validation(
                "Popular durations must be greater than 0".to_string(),
            ));
        }

        self.runner.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            popular: vec![15, 30, 60, 600, 900, 1800],
            runner: RunnerConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Validate runner configuration
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Validation(
                "Tick interval must be greater than 0".to_string(),
            ));
        }

        const MAX_TICK_MS: u64 = 60_000;
        if self.tick_interval_ms > MAX_TICK_MS {
            return Err(Error::Validation(format!(
                "Tick interval too long (max {} ms)",
                MAX_TICK_MS
            )));
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(Error::Validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.log_level,
                valid_log_levels.join(", ")
            )));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            auto_advance: true,
            log_level: "info".to_string(),
        }
    }
}
