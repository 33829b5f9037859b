// src/logging.rs

//! Global `log` backend for processes embedding the engine.
//!
//! Lines look like:
//! `[2025-04-25T16:32:10+02:00][INFO ][rules::engine][pid=4568][tid=ThreadId(1)] engine started`

use std::{path::Path, process, thread};

use chrono::Local;
use fern::Dispatch;

use crate::config::LoggingConfig;

/// Install the global logger described by `cfg`.
///
/// Always logs to stdout; when `cfg.enable` is set, also appends to
/// `cfg.file` (default `rules-engine.log`) resolved against `base_dir`.
pub fn setup(cfg: &LoggingConfig, base_dir: &Path) -> Result<(), fern::InitError> {
    let log_path = cfg
        .enable
        .then(|| base_dir.join(cfg.file.as_deref().unwrap_or("rules-engine.log")));

    let mut dispatch = Dispatch::new()
        .format(|out, msg, record| {
            out.finish(format_args!(
                "[{}][{:5}][{}][pid={}][tid={:?}] {}",
                Local::now().to_rfc3339(),
                record.level(),
                record.target(),
                process::id(),
                thread::current().id(),
                msg
            ))
        })
        .level(cfg.level_filter())
        .chain(std::io::stdout());

    if let Some(path) = log_path {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}
