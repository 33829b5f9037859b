//! Run counters, kept as atomics and mirrored to the `metrics` facade.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct EngineStats {
    events:     AtomicU64,
    dispatched: AtomicU64,
    unroutable: AtomicU64,
    signatures: AtomicU64,
    errors:     AtomicU64,
    detections: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Events read from any source.
    pub events: u64,
    /// Deliveries into signature queues (one event may count several times).
    pub dispatched: u64,
    /// Events dropped because no native selector could be extracted.
    pub unroutable: u64,
    /// Signatures that passed validation and init.
    pub signatures: u64,
    /// Failed `on_event` / `on_signal` calls.
    pub errors: u64,
    /// Findings accepted by the sink.
    pub detections: u64,
}

impl EngineStats {
    pub(crate) fn record_event(&self) {
        self.events.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rules_engine_events_total").increment(1);
    }

    pub(crate) fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rules_engine_dispatched_total").increment(1);
    }

    pub(crate) fn record_unroutable(&self) {
        self.unroutable.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rules_engine_unroutable_total").increment(1);
    }

    pub(crate) fn record_signature_loaded(&self) {
        self.signatures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rules_engine_signatures_loaded_total").increment(1);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rules_engine_signature_errors_total").increment(1);
    }

    pub(crate) fn record_detection(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rules_engine_detections_total").increment(1);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events:     self.events.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            unroutable: self.unroutable.load(Ordering::Relaxed),
            signatures: self.signatures.load(Ordering::Relaxed),
            errors:     self.errors.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
        }
    }
}
