//! Selector validation, the selector index and native selector extraction.

pub mod index;
pub mod native;

pub use index::{SelectorIndex, SignatureId};
pub use native::{NativeSelector, native_selector};

use shared::constants::{ALL_EVENT_ORIGINS, ALL_EVENT_TYPES};
use shared::{Origin, SignatureEventSelector};
use thiserror::Error;

/// Origin constraint of one indexed selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginFilter {
    Any,
    Host,
    Container,
}

impl OriginFilter {
    /// `""` and `"*"` mean any origin; anything other than host/container is
    /// rejected.
    pub fn parse(origin: &str) -> Option<Self> {
        match origin {
            "" | ALL_EVENT_ORIGINS => Some(OriginFilter::Any),
            _ => match origin.parse::<Origin>().ok()? {
                Origin::Host => Some(OriginFilter::Host),
                Origin::Container => Some(OriginFilter::Container),
            },
        }
    }

    pub fn admits(self, origin: Origin) -> bool {
        match self {
            OriginFilter::Any => true,
            OriginFilter::Host => origin == Origin::Host,
            // Also admits host-resolved events: existing container signatures
            // rely on seeing events whose container id was never filled in.
            OriginFilter::Container => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OriginFilter::Any => ALL_EVENT_ORIGINS,
            OriginFilter::Host => Origin::Host.as_str(),
            OriginFilter::Container => Origin::Container.as_str(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("missing source")]
    MissingSource,

    #[error("invalid origin {0}")]
    InvalidOrigin(String),
}

/// A validated selector with wildcards folded to `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedSelector {
    pub source: String,
    pub name: String,
    pub origin: OriginFilter,
}

impl TryFrom<&SignatureEventSelector> for NormalizedSelector {
    type Error = SelectorError;

    fn try_from(sel: &SignatureEventSelector) -> Result<Self, Self::Error> {
        if sel.source.is_empty() {
            return Err(SelectorError::MissingSource);
        }
        let origin = OriginFilter::parse(&sel.origin)
            .ok_or_else(|| SelectorError::InvalidOrigin(sel.origin.clone()))?;
        let name = if sel.name.is_empty() { ALL_EVENT_TYPES.to_owned() } else { sel.name.clone() };

        Ok(Self { source: sel.source.clone(), name, origin })
    }
}

impl From<&NormalizedSelector> for SignatureEventSelector {
    fn from(n: &NormalizedSelector) -> Self {
        SignatureEventSelector::new(n.source.clone(), n.name.clone(), n.origin.as_str())
    }
}
