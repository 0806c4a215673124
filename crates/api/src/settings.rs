//! Application configuration
//!
//! Layered: optional TOML file, then `DROWSY__SECTION__KEY` environment
//! variables.

use config::{Config, ConfigError, Environment, File};
use dms::{DmsConfig, DmsError};
use landmark_source::ReplayConfig;
use serde::Deserialize;

/// Config file used when `DROWSY_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub dms: DmsConfig,
    pub source: ReplayConfig,
    /// Start a monitoring session as soon as the server is up
    pub start_on_boot: bool,
}

impl AppConfig {
    /// Load from the file named by `DROWSY_CONFIG`, or the default path
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("DROWSY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from a specific file; a missing file falls back to defaults
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("DROWSY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.dms = config
            .calibrated_dms()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(config)
    }

    /// DMS config rescaled to the source's playback rate, so the onset
    /// latency stays the one `dms.nominal_fps` was tuned for
    pub fn calibrated_dms(&self) -> Result<DmsConfig, DmsError> {
        let fps = self.source.effective_fps();
        if fps == self.dms.nominal_fps {
            self.dms.validate()?;
            return Ok(self.dms.clone());
        }

        self.dms.for_frame_rate(fps)
    }
}
