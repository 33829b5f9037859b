// src/config/model.rs

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

/// Top-level settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)] pub engine:  Config,
    #[serde(default)] pub logging: LoggingConfig,
}

/// Mirror of the `[engine]` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-signature queue depth. Once a slow signature has this many events
    /// pending, its source reader waits.
    pub signature_buffer: usize,
    /// Suggested depth for the source queues callers build with
    /// [`Config::source_channel`].
    pub source_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { signature_buffer: 1_000, source_buffer: 1_000 }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signature_buffer == 0 {
            return Err(ConfigError::InvalidValue("engine.signature_buffer", "must be > 0".into()));
        }
        if self.source_buffer == 0 {
            return Err(ConfigError::InvalidValue("engine.source_buffer", "must be > 0".into()));
        }
        Ok(())
    }

    /// Bounded source queue sized by `source_buffer`.
    pub fn source_channel<T>(&self) -> (tokio::sync::mpsc::Sender<T>, tokio::sync::mpsc::Receiver<T>) {
        tokio::sync::mpsc::channel(self.source_buffer.max(1))
    }
}

/// Mirror of the `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]                   pub enable: bool,
    #[serde(default)]                   pub file:   Option<String>,
    #[serde(default = "default_level")] pub level:  String,
}
fn default_level() -> String { "INFO".into() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: false, file: None, level: default_level() }
    }
}

impl LoggingConfig {
    /// Unknown levels fall back to INFO.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_uppercase().as_str() {
            "OFF"   => LevelFilter::Off,
            "ERROR" => LevelFilter::Error,
            "WARN"  => LevelFilter::Warn,
            "DEBUG" => LevelFilter::Debug,
            "TRACE" => LevelFilter::Trace,
            _       => LevelFilter::Info,
        }
    }
}

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{0}': {1}")]
    InvalidValue(&'static str, String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
