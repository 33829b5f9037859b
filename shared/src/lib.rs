//! Types shared between event producers, the rules engine and signatures.

pub mod constants;
pub mod protocol;
pub mod trace;

pub use protocol::{
    Event, EventHeaders, Finding, Origin, OriginParseError, Payload, Signal,
    SignatureEventSelector, SignatureMetadata,
};
pub use trace::{ArgMeta, Argument, TraceEvent};
