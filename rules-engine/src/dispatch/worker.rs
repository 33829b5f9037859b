use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tokio::sync::mpsc;

use super::Message;
use crate::diagnostics::Diagnostics;
use crate::signature::Signature;
use crate::stats::EngineStats;

/// Blocking loop owning one signature; run it on `spawn_blocking`.
///
/// Drains the queue until every sender is gone, then closes the signature.
/// Callback errors and panics are reported and the loop carries on.
pub fn run(
    mut signature: Box<dyn Signature>,
    name: Arc<str>,
    mut rx: mpsc::Receiver<Message>,
    diagnostics: Arc<Diagnostics>,
    stats: Arc<EngineStats>,
) {
    log::debug!("worker for signature '{name}' started");

    while let Some(msg) = rx.blocking_recv() {
        let what = msg.kind();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &msg {
            Message::Event(event) => signature.on_event(event),
            Message::Signal(signal) => signature.on_signal(signal),
        }));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                stats.record_error();
                diagnostics.error(&format!("error handling {what} by signature {name}: {e:#}"));
            }
            Err(panic) => {
                stats.record_error();
                diagnostics.error(&format!(
                    "signature {name} panicked handling {what}: {}",
                    panic_message(panic.as_ref())
                ));
            }
        }
    }

    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| signature.close())) {
        diagnostics.error(&format!("signature {name} panicked while closing: {}", panic_message(panic.as_ref())));
        return;
    }
    log::info!("signature '{name}' closed");
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
