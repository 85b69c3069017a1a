//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::types::Horizon;

/// Upper bound for the configured iteration cap.
pub const MAX_ITERATION_CAP: u32 = 1_000;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Statement engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Result cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Modeled horizon.
    #[serde(default)]
    pub horizon: HorizonConfig,
}

/// Statement engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Absolute balance tolerance in currency units.
    #[serde(default = "default_tolerance")]
    pub tolerance: Decimal,
    /// Maximum number of full-horizon passes.
    #[serde(default = "default_iteration_cap")]
    pub iteration_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            iteration_cap: default_iteration_cap(),
        }
    }
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_iteration_cap() -> u32 {
    10
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached statement sets.
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    /// Time-to-live in seconds for each entry.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_capacity() -> u64 {
    100
}

fn default_ttl_secs() -> u64 {
    300 // 5 minutes
}

/// Horizon configuration (`MODEL_START_YEAR` / `MODEL_END_YEAR`).
#[derive(Debug, Clone, Deserialize)]
pub struct HorizonConfig {
    /// First modeled year.
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    /// Last modeled year (inclusive).
    #[serde(default = "default_end_year")]
    pub end_year: i32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            start_year: default_start_year(),
            end_year: default_end_year(),
        }
    }
}

fn default_start_year() -> i32 {
    2025
}

fn default_end_year() -> i32 {
    2029
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FORECAST").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Checks the loaded values for consistency.
    pub fn validate(&self) -> AppResult<()> {
        if self.engine.tolerance.is_sign_negative() {
            return Err(AppError::Configuration(
                "engine.tolerance must not be negative".to_string(),
            ));
        }
        if self.engine.iteration_cap == 0 || self.engine.iteration_cap > MAX_ITERATION_CAP {
            return Err(AppError::Configuration(format!(
                "engine.iteration_cap must be between 1 and {MAX_ITERATION_CAP}"
            )));
        }
        if self.cache.max_capacity == 0 {
            return Err(AppError::Configuration(
                "cache.max_capacity must be at least 1".to_string(),
            ));
        }
        self.horizon()?;
        Ok(())
    }

    /// Returns the configured horizon.
    pub fn horizon(&self) -> AppResult<Horizon> {
        Horizon::new(self.horizon.start_year, self.horizon.end_year).ok_or_else(|| {
            AppError::Configuration(format!(
                "horizon.start_year {} is after horizon.end_year {}",
                self.horizon.start_year, self.horizon.end_year
            ))
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
