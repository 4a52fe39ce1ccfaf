//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TelloLinkError};
use crate::telemetry::OutputFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub demux: DemuxConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log stream demultiplexer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DemuxConfig {
    #[serde(default)]
    pub verify_checksums: bool,
}

/// Decoded telemetry output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default = "default_output_path")]
    pub path: String,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to this file when set
    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_output_path() -> String { "./telemetry.csv".to_string() }

fn default_log_level() -> String { "info".to_string() }

/// Supported log levels
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Default for DemuxConfig {
    fn default() -> Self {
        Self { verify_checksums: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: default_output_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
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
    /// use tello_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.output.path.is_empty() {
            return Err(TelloLinkError::Config(
                toml::de::Error::custom("output path cannot be empty")
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(TelloLinkError::Config(
                toml::de::Error::custom("log level must be one of: trace, debug, info, warn, error")
            ));
        }

        if let Some(file) = &self.logging.file {
            if file.is_empty() {
                return Err(TelloLinkError::Config(
                    toml::de::Error::custom("log file cannot be empty when set")
                ));
            }
        }

        Ok(())
    }
}
