//! Native selector extraction: which `(source, name, origin)` an incoming
//! event answers to.

use shared::constants::TRACEE_SOURCE;
use shared::{Event, Origin, TraceEvent};

use crate::error::EngineError;

/// Selector triple of a concrete event, borrowed from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSelector<'a> {
    pub source: &'a str,
    pub name: &'a str,
    pub origin: Origin,
}

/// Only tracee envelopes are routable; anything else is rejected.
pub fn native_selector(event: &Event) -> Result<NativeSelector<'_>, EngineError> {
    if event.headers.source != TRACEE_SOURCE {
        return Err(EngineError::UnsupportedSource(event.headers.source.clone()));
    }
    let trace = event
        .payload
        .downcast_ref::<TraceEvent>()
        .ok_or_else(|| EngineError::UnexpectedPayload(TRACEE_SOURCE.into(), "TraceEvent"))?;

    Ok(NativeSelector {
        source: TRACEE_SOURCE,
        name: &trace.event_name,
        origin: trace.origin(),
    })
}
