//! Signature contract and the finding handler signatures publish through.

use std::sync::Arc;

use shared::{Event, Finding, Signal, SignatureEventSelector, SignatureMetadata};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::PublishError;
use crate::stats::EngineStats;

/// A unit of detection logic.
///
/// The engine owns each registered signature and drives it from a dedicated
/// worker thread, so implementations may block in any callback without
/// affecting other signatures. Callbacks for one signature are never run
/// concurrently.
pub trait Signature: Send {
    /// Identity and descriptive fields. `name` labels every diagnostic.
    fn metadata(&self) -> anyhow::Result<SignatureMetadata>;

    /// Events this signature wants to receive.
    fn selected_events(&self) -> anyhow::Result<Vec<SignatureEventSelector>>;

    /// One-time setup, before any event. `handler` may be kept and used to
    /// publish findings from any later callback.
    fn init(&mut self, handler: FindingHandler) -> anyhow::Result<()>;

    /// Called once per matching selector for every matching event.
    fn on_event(&mut self, event: &Event) -> anyhow::Result<()>;

    fn on_signal(&mut self, _signal: &Signal) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called exactly once at engine shutdown.
    fn close(&mut self) {}
}

/// Send side of the findings sink, handed to every signature at `init`.
#[derive(Clone)]
pub struct FindingHandler {
    tx: mpsc::Sender<Finding>,
    stats: Arc<EngineStats>,
}

impl FindingHandler {
    pub(crate) fn new(tx: mpsc::Sender<Finding>, stats: Arc<EngineStats>) -> Self {
        Self { tx, stats }
    }

    /// Blocks while the sink is full.
    ///
    /// Must not be called from inside an async task; signature callbacks run
    /// on blocking threads where this is fine.
    pub fn publish(&self, finding: Finding) -> Result<(), PublishError> {
        self.tx.blocking_send(finding).map_err(|_| PublishError::Closed)?;
        self.stats.record_detection();
        Ok(())
    }

    pub async fn publish_async(&self, finding: Finding) -> Result<(), PublishError> {
        self.tx.send(finding).await.map_err(|_| PublishError::Closed)?;
        self.stats.record_detection();
        Ok(())
    }

    pub fn try_publish(&self, finding: Finding) -> Result<(), PublishError> {
        self.tx.try_send(finding).map_err(|e| match e {
            TrySendError::Full(_) => PublishError::Full,
            TrySendError::Closed(_) => PublishError::Closed,
        })?;
        self.stats.record_detection();
        Ok(())
    }
}
