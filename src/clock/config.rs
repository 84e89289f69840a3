//! Clock configuration for the refresh cadence and the time source.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Refresh parameters.
///
/// | Field              | Unit | Description                                   | Example |
/// |--------------------|------|-----------------------------------------------|---------|
/// | tick_interval_ms   | ms   | Time between two display refreshes            | 1000    |
/// | simulation         | -    | Use a simulated clock instead of the host one | absent  |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Refresh interval in milliseconds
    #[serde(default = "ClockConfig::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Simulated clock parameters; the host wall clock is used when absent
    #[serde(default)]
    pub simulation: Option<SimulationConfig>,
}

/// Simulated clock parameters.
///
/// | Field       | Unit | Description                              | Example |
/// |-------------|------|------------------------------------------|---------|
/// | drift_rate  | μs/s | Drift per real second; (+) fast (−) slow | 50      |
/// | sync_freq   | Hz   | Resyncs per second; interval = 1/freq    | 1       |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub drift_rate: f64,
    #[serde(default = "SimulationConfig::default_sync_freq")]
    pub sync_freq: f64,
}

impl ClockConfig {
    /// Load clock config from the file path in `CONFIG_FILE` env var.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE")
            .map_err(|_| ConfigError::Message("CONFIG_FILE environment variable not set".into()))?;
        Self::from_file(&path)
    }

    /// Load clock config from a TOML file. Supports:
    /// - Files with a `[clock]` section (e.g. app configs)
    /// - Flat files with `tick_interval_ms` and `[simulation]` at root
    ///
    /// Environment variables such as `AGENTIC_CLOCK_CLOCK__TICK_INTERVAL_MS`
    /// override file values in either layout.
    pub fn from_file(config_file: &str) -> Result<Self, ConfigError> {
        let file_only = Config::builder()
            .add_source(File::with_name(config_file))
            .build()?;
        let sectioned = file_only.get_table("clock").is_ok();

        // Flat files hold the clock keys at the root, so the `CLOCK__` part
        // of the variable name belongs to the prefix.
        let overrides = if sectioned {
            Environment::with_prefix("AGENTIC_CLOCK").prefix_separator("_")
        } else {
            Environment::with_prefix("AGENTIC_CLOCK_CLOCK").prefix_separator("__")
        };
        let config = Config::builder()
            .add_source(File::with_name(config_file))
            .add_source(overrides.separator("__").try_parsing(true))
            .build()?;

        let clock: Self = if sectioned {
            config.get("clock")?
        } else {
            config.try_deserialize()?
        };
        clock.validate()?;
        Ok(clock)
    }

    /// Rejects values that cannot drive a clock.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.simulation {
            Some(simulation) => simulation.validate(),
            None => Ok(()),
        }
    }

    /// Refresh interval; a zero value is rejected by the controller.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn default_tick_interval_ms() -> u64 {
        1000
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.drift_rate.is_finite() {
            return Err(ConfigError::Message(format!(
                "simulation.drift_rate must be finite, got {}",
                self.drift_rate
            )));
        }
        if !(self.sync_freq.is_finite() && self.sync_freq > 0.0) {
            return Err(ConfigError::Message(format!(
                "simulation.sync_freq must be a positive number of Hz, got {}",
                self.sync_freq
            )));
        }
        Ok(())
    }

    fn default_sync_freq() -> f64 {
        1.0
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Self::default_tick_interval_ms(),
            simulation: None,
        }
    }
}
