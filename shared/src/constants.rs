/// Source identity stamped on every envelope produced by the tracee adapter.
pub const TRACEE_SOURCE: &str = "tracee";
/// Content type of envelopes carrying a `TraceEvent` payload.
pub const TRACEE_CONTENT_TYPE: &str = "tracee.v1";

/// Selector wildcard for "any event name from this source".
pub const ALL_EVENT_TYPES: &str = "*";
/// Selector wildcard for "any origin".
pub const ALL_EVENT_ORIGINS: &str = "*";
