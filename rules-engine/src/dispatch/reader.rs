use std::sync::Arc;

use shared::Event;
use tokio::sync::{mpsc, watch};

use super::{Dispatcher, stopped};

/// Drain one named source until stop fires or every sender is dropped.
///
/// A closed source is reported to its subscribers with
/// `Signal::SourceComplete(source)`; the engine keeps running.
pub async fn run(
    source: String,
    mut rx: mpsc::Receiver<Event>,
    dispatcher: Arc<Dispatcher>,
    mut stop: watch::Receiver<bool>,
) {
    log::info!("source reader '{source}' started");
    loop {
        let next = tokio::select! {
            biased;
            _ = stopped(&mut stop) => break,
            next = rx.recv() => next,
        };
        let Some(event) = next else {
            log::info!("source '{source}' closed");
            dispatcher.source_complete(&source, &mut stop).await;
            break;
        };

        if !dispatcher.dispatch(event, &mut stop).await {
            break;
        }
    }
    log::info!("source reader '{source}' exited");
}
