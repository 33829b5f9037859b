use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    #[error("unsupported or unrecognized source: {0:?}")]
    UnsupportedSource(String),

    #[error("payload of a {0} event is not a {1}")]
    UnexpectedPayload(String, &'static str),
}

/// Why a finding could not be handed to the sink.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("findings sink is closed")]
    Closed,

    #[error("findings sink is full")]
    Full,
}
