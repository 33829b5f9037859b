//! Event fan-in / fan-out.
//! ---------------------------------------------------------------------------
//! One **reader** task per source queue pulls events, resolves their native
//! selector and pushes a clone into the queue of every interested signature.
//! One **worker** per signature drains its queue on a blocking thread and
//! runs the callbacks.
//!
//! Per-signature queues are bounded: a signature that falls behind only
//! stalls its readers once its own queue is full. Other signatures keep
//! receiving what is already routed to them.

pub mod reader;
pub mod worker;

use std::sync::Arc;

use shared::{Event, Signal};
use tokio::sync::{mpsc, watch};

use crate::selector::{SelectorIndex, SignatureId, native_selector};
use crate::stats::EngineStats;

/// What travels through a signature queue.
#[derive(Debug)]
pub enum Message {
    Event(Event),
    Signal(Signal),
}

impl Message {
    /// Label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Event(_) => "event",
            Message::Signal(_) => "signal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    Dropped,
    Stopped,
}

/// Send side of one signature's queue.
pub struct Route {
    pub name: Arc<str>,
    pub tx: mpsc::Sender<Message>,
}

/// State shared by every reader.
pub struct Dispatcher {
    index: Arc<SelectorIndex>,
    routes: Vec<Route>,
    stats: Arc<EngineStats>,
}

/// Resolves once the stop flag is raised or its sender is gone.
pub async fn stopped(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|raised| *raised).await;
}

impl Dispatcher {
    /// `routes[id]` must belong to the signature indexed as `id`.
    pub fn new(index: Arc<SelectorIndex>, routes: Vec<Route>, stats: Arc<EngineStats>) -> Self {
        Self { index, routes, stats }
    }

    /// Route one event. Returns `false` if stop fired mid fan-out.
    ///
    /// Stop abandons the rest of the fan-out: signatures after the one whose
    /// full queue the reader was parked on do not get this event.
    pub async fn dispatch(&self, event: Event, stop: &mut watch::Receiver<bool>) -> bool {
        self.stats.record_event();

        let matched = match native_selector(&event) {
            Ok(native) => self.index.lookup(&native),
            Err(e) => {
                log::debug!("dropping event '{}': {}", event.headers.name, e);
                self.stats.record_unroutable();
                return true;
            }
        };

        for id in matched {
            match self.deliver(id, Message::Event(event.clone()), stop).await {
                Delivery::Sent => self.stats.record_dispatch(),
                Delivery::Dropped => {}
                Delivery::Stopped => return false,
            }
        }
        true
    }

    /// Tell every signature watching `source` that it has no more events.
    pub async fn source_complete(&self, source: &str, stop: &mut watch::Receiver<bool>) {
        for id in self.index.subscribers(source) {
            let signal = Message::Signal(Signal::SourceComplete(source.to_owned()));
            if self.deliver(id, signal, stop).await == Delivery::Stopped {
                return;
            }
        }
    }

    async fn deliver(&self, id: SignatureId, msg: Message, stop: &mut watch::Receiver<bool>) -> Delivery {
        let route = &self.routes[id];
        tokio::select! {
            biased;
            _ = stopped(stop) => Delivery::Stopped,
            sent = route.tx.send(msg) => match sent {
                Ok(()) => Delivery::Sent,
                Err(_) => {
                    log::warn!("worker for signature '{}' is gone; message dropped", route.name);
                    Delivery::Dropped
                }
            },
        }
    }
}
