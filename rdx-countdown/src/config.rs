//! Defines all configuration structures for the countdown timer.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde` and the `config` crate, layered with
//! `COUNTDOWN_*` environment variables. This lets a host set the round length,
//! the comparison tolerance and its own tick cadence without recompiling.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Tolerance applied to every float comparison the scheduler makes.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// The top-level configuration for a `Timer`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TimerConfig {
    /// Length of one round in seconds.
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Absolute tolerance for "has the reading reached this value" checks.
    /// Absorbs the error accumulated by many small `update` calls.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// How often the host is expected to call `update`.
    #[serde(default = "default_resolution")]
    pub resolution: ClockResolution,
}

/// Defines the cadence of the host loop that drives the timer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// ~60 ticks per second. Suitable for real-time applications.
    High,
    /// ~30 ticks per second. Suitable for general purpose simulations.
    Medium,
    /// ~1 tick per second. Suitable for strategic or turn-based logic.
    Low,
    /// A user-defined speed in ticks per second.
    Custom { ticks_per_second: u64 },
}

impl ClockResolution {
    pub fn ticks_per_second(&self) -> u64 {
        match self {
            ClockResolution::High => 60,
            ClockResolution::Medium => 30,
            ClockResolution::Low => 1,
            ClockResolution::Custom { ticks_per_second } => (*ticks_per_second).max(1),
        }
    }

    /// The time between two host ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.ticks_per_second() as f64)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            epsilon: default_epsilon(),
            resolution: default_resolution(),
        }
    }
}

impl TimerConfig {
    /// Loads a config from an optional TOML file plus `COUNTDOWN_*`
    /// environment variables (e.g. `COUNTDOWN_DURATION=90`).
    ///
    /// Missing keys fall back to `TimerConfig::default()`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let config: Self = builder
            .add_source(Environment::with_prefix("COUNTDOWN"))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config from TOML text, with defaults for missing keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.duration >= 0.0 && self.duration.is_finite()) {
            return Err(ConfigError::Message(format!(
                "duration must be a non-negative number of seconds, got {}",
                self.duration
            )));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(ConfigError::Message(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

// --- Default value functions for serde ---

fn default_duration() -> f64 {
    60.0
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_resolution() -> ClockResolution {
    ClockResolution::Low
}
