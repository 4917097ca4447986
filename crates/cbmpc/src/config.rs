//! Ambient harness configuration (§6, AMBIENT): logging and transport
//! tuning knobs a deployment sets once at startup, loaded from an
//! optional TOML file with every field defaulted.

use cbmpc_transport::TransportOptions;
use cbmpc_types::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// Structured-logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `"trace"` | `"debug"` | `"info"` | `"warn"` | `"error"`, or any
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON-formatted log lines instead of the human-readable
    /// default. Useful when the harness runs under a log collector.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Transport tuning, mirrored from [`TransportOptions`] so it can be
/// loaded from a config file instead of constructed in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_dial_retry_millis")]
    pub dial_retry_millis: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
            connect_timeout_secs: default_connect_timeout_secs(),
            dial_retry_millis: default_dial_retry_millis(),
        }
    }
}

fn default_max_frame_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_dial_retry_millis() -> u64 {
    200
}

impl TransportConfig {
    pub fn to_options(&self) -> TransportOptions {
        TransportOptions {
            max_frame_size: self.max_frame_bytes,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            dial_retry_interval: Duration::from_millis(self.dial_retry_millis),
        }
    }
}

impl HarnessConfig {
    /// Loads configuration from `path`, falling back to defaults if the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigInvalid(format!("reading {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::ConfigInvalid(format!("parsing {}: {e}", path.display())))
    }

    /// The default config file location, honoring `CBMPC_CONFIG_DIR` if
    /// set.
    pub fn default_path() -> PathBuf {
        std::env::var("CBMPC_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("cbmpc.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.transport.max_frame_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = HarnessConfig::load(Path::new("/nonexistent/cbmpc.toml"))
            .expect("missing config file falls back to defaults");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = HarnessConfig::default();
        let serialized = toml::to_string(&config).expect("serialize");
        let parsed: HarnessConfig = toml::from_str(&serialized).expect("parse");
        assert_eq!(parsed.logging.level, config.logging.level);
    }

    #[test]
    fn test_transport_config_converts_to_options() {
        let config = TransportConfig::default();
        let opts = config.to_options();
        assert_eq!(opts.max_frame_size, 64 * 1024 * 1024);
    }
}
