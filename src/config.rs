//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{PadlinkError, Result};
use crate::haptics::VibrationPreset;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub haptics: HapticsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input polling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,

    #[serde(default = "default_discovery_interval_ms")]
    pub discovery_interval_ms: u64,
}

/// Haptics configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HapticsConfig {
    #[serde(default = "default_haptics_enabled")]
    pub enabled: bool,

    #[serde(default = "default_connect_preset")]
    pub connect_preset: String,

    #[serde(default = "default_connect_duration_ms")]
    pub connect_duration_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; empty logs to stdout only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_frame_rate_hz() -> u32 { 60 }
fn default_discovery_interval_ms() -> u64 { 500 }

fn default_haptics_enabled() -> bool { true }
fn default_connect_preset() -> String { "mild".to_string() }
fn default_connect_duration_ms() -> u64 { 200 }

fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: default_frame_rate_hz(),
            discovery_interval_ms: default_discovery_interval_ms(),
        }
    }
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_haptics_enabled(),
            connect_preset: default_connect_preset(),
            connect_duration_ms: default_connect_duration_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl InputConfig {
    /// Hot-plug discovery interval
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }
}

impl HapticsConfig {
    /// Preset played on connect
    ///
    /// # Errors
    ///
    /// Returns `UnknownPreset` if `connect_preset` is not a preset name.
    pub fn preset(&self) -> Result<VibrationPreset> {
        self.connect_preset.parse()
    }

    /// Length of the connect rumble
    pub fn connect_duration(&self) -> Duration {
        Duration::from_millis(self.connect_duration_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padlink::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing or validation fails
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate input timing
        if self.input.frame_rate_hz == 0 || self.input.frame_rate_hz > 1000 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("frame_rate_hz must be between 1 and 1000")
            ));
        }

        if self.input.discovery_interval_ms < 10 || self.input.discovery_interval_ms > 60000 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("discovery_interval_ms must be between 10 and 60000")
            ));
        }

        // Validate haptics
        if self.haptics.preset().is_err() {
            return Err(PadlinkError::Config(
                toml::de::Error::custom(format!(
                    "connect_preset '{}' must be one of: mild, medium, strong",
                    self.haptics.connect_preset
                ))
            ));
        }

        if self.haptics.connect_duration_ms == 0 || self.haptics.connect_duration_ms > 10000 {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("connect_duration_ms must be between 1 and 10000")
            ));
        }

        // Validate log level
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(PadlinkError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        Ok(())
    }
}
