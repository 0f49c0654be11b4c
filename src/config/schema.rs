//! Configuration schema definitions.
//!
//! All sections have defaults, so an empty file (or no file) is a valid
//! configuration.

use super::error::{ConfigError, ConfigResult};
use crate::port::PortConfiguration;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Binding files to load at startup; each file is one context
    pub bindings: Vec<PathBuf>,
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.open_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.open_timeout_ms",
                "must be greater than zero",
            ));
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::validation("logging.level", e.to_string()));
        }
        Ok(())
    }
}

/// Serial port configuration section.
///
/// Line settings are fixed at 9600-8-N-1 and therefore not configurable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Time allowed for a port to open, in milliseconds
    pub open_timeout_ms: u64,
    /// Check that a port is enumerated by the system before opening it
    pub verify_port_exists: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            open_timeout_ms: 2000,
            verify_port_exists: true,
        }
    }
}

impl SerialConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Port settings for opening a URTSI.
    pub fn port_configuration(&self) -> PortConfiguration {
        PortConfiguration::urtsi(self.open_timeout())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "urtsi_bridge=debug"; `RUST_LOG` takes precedence
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}
