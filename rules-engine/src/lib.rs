// src/lib.rs
// ────────────────────────────────────────────────────────────────────────────
// Public library entry point: signature selector matching and dispatch.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod selector;
pub mod signature;
pub mod stats;

mod diagnostics;
mod dispatch;

pub use config::Config;
pub use engine::{Engine, EventSources};
pub use error::{EngineError, PublishError};
pub use signature::{FindingHandler, Signature};
pub use stats::{EngineStats, StatsSnapshot};

pub use shared;
