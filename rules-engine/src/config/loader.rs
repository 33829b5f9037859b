// src/config/loader.rs

//! # Configuration Loader
//!
//! Reads a TOML settings file and validates the engine section.

use crate::config::model::{ConfigError, Settings};
use std::{fs, path::Path};

/// Load, parse and validate the settings at `path`.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    log::debug!("Reading config from {:?}", path);
    let txt = fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&txt)?;
    settings.engine.validate()?;
    log::info!("Loaded config from {:?}", path);
    Ok(settings)
}
