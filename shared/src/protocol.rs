//! Envelope model exchanged between event sources, the engine and signatures.
//!
//! An [`Event`] carries routing headers plus an opaque [`Payload`]. The engine
//! never looks inside the payload except to resolve the native selector of
//! sources it knows about; signatures downcast it to the concrete type they
//! expect.
//!
//! Signatures describe what they want to see with [`SignatureEventSelector`]s
//! and report detections as [`Finding`]s.

use std::{any::Any, collections::BTreeMap, fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Execution context an event was observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Host,
    Container,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Host => "host",
            Origin::Container => "container",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid origin '{0}'")]
pub struct OriginParseError(pub String);

impl FromStr for Origin {
    type Err = OriginParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(Origin::Host),
            "container" => Ok(Origin::Container),
            other => Err(OriginParseError(other.into())),
        }
    }
}

/// Opaque, cheaply clonable event body.
///
/// Every clone shares the same allocation, so a payload fanned out to many
/// signatures is never copied or mutated.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Payload(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// `true` when both handles point at the same payload allocation.
    pub fn ptr_eq(&self, other: &Payload) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// Routing metadata set once by the payload adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventHeaders {
    /// Producing subsystem, e.g. `"tracee"`.
    pub source: String,
    /// Event kind within `source`.
    pub name: String,
    /// `None` when the adapter could not classify the event.
    pub origin: Option<Origin>,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub headers: EventHeaders,
    pub payload: Payload,
}

impl Event {
    pub fn new<T: Any + Send + Sync>(headers: EventHeaders, payload: T) -> Self {
        Self { headers, payload: Payload::new(payload) }
    }
}

/// Declared interest of a signature.
///
/// `name` and `origin` accept `""` or `"*"` as wildcards; `source` is
/// mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureEventSelector {
    pub source: String,
    pub name: String,
    pub origin: String,
}

impl SignatureEventSelector {
    pub fn new(source: impl Into<String>, name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self { source: source.into(), name: name.into(), origin: origin.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureMetadata {
    /// Stable identifier, e.g. `"TRC-2"`. Used to reject duplicate loads.
    pub id: String,
    pub version: String,
    /// Display name used in every diagnostic about this signature.
    pub name: String,
    pub event_name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Detection result published by a signature.
#[derive(Debug, Clone)]
pub struct Finding {
    pub data: BTreeMap<String, serde_json::Value>,
    /// Event that triggered the detection.
    pub event: Event,
    pub metadata: SignatureMetadata,
}

/// Out-of-band control messages delivered through `on_signal`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Signal {
    /// The named source queue closed; no further events will arrive from it.
    SourceComplete(String),
}
