//! Engine: loads signatures, owns the dispatcher for one run, shuts down.
//!
//! 1. `Engine::new` validates every signature, builds the selector index and
//!    initialises the survivors. Broken signatures are reported on the
//!    diagnostics sink and set aside; construction itself only fails on a
//!    bad [`Config`].
//! 2. `Engine::start` spawns one worker per signature and one reader per
//!    source, then waits for the stop future.
//! 3. On stop the readers exit, workers drain their queues and every
//!    registered signature is closed exactly once before `start` returns.

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    io::Write,
    sync::Arc,
};

use futures::future::join_all;
use shared::{Event, Finding, SignatureEventSelector};
use tokio::{
    sync::{mpsc, watch},
    task,
};

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::dispatch::{Dispatcher, Route, reader, worker};
use crate::error::EngineError;
use crate::selector::{NormalizedSelector, SelectorError, SelectorIndex};
use crate::signature::{FindingHandler, Signature};
use crate::stats::EngineStats;

/// Named source queues. The key labels the reader in logs and is the source
/// reported in `Signal::SourceComplete`.
pub type EventSources = HashMap<String, mpsc::Receiver<Event>>;

struct Loaded {
    name: Arc<str>,
    signature: Box<dyn Signature>,
}

pub struct Engine {
    config: Config,
    sources: EventSources,
    index: Arc<SelectorIndex>,
    interest: Arc<HashSet<SignatureEventSelector>>,
    loaded: Vec<Loaded>,
    /// Signatures that failed to load; only `close` is ever called on them.
    rejected: Vec<Box<dyn Signature>>,
    diagnostics: Arc<Diagnostics>,
    stats: Arc<EngineStats>,
}

impl Engine {
    pub fn new<W>(
        signatures: Vec<Box<dyn Signature>>,
        sources: EventSources,
        output: mpsc::Sender<Finding>,
        diagnostics: W,
        config: Config,
    ) -> Result<Self, EngineError>
    where
        W: Write + Send + 'static,
    {
        config.validate()?;

        let stats = Arc::new(EngineStats::default());
        let mut loader = Loader {
            diagnostics: Arc::new(Diagnostics::new(diagnostics)),
            handler: FindingHandler::new(output, stats.clone()),
            index: SelectorIndex::default(),
            loaded: Vec::with_capacity(signatures.len()),
            rejected: Vec::new(),
            ids: HashSet::new(),
        };
        for signature in signatures {
            loader.load(signature);
        }

        let Loader { diagnostics, index, loaded, rejected, .. } = loader;
        for _ in &loaded {
            stats.record_signature_loaded();
        }
        log::info!(
            "engine ready: {} signature(s) loaded, {} rejected, {} source(s)",
            loaded.len(),
            rejected.len(),
            sources.len()
        );

        Ok(Self {
            config,
            sources,
            interest: Arc::new(index.interest().clone()),
            index: Arc::new(index),
            loaded,
            rejected,
            diagnostics,
            stats,
        })
    }

    /// Union of the selectors of every loaded signature.
    ///
    /// Wildcards are spelled `*`. Identical triples appear once, but the same
    /// `(source, name)` with different origins is kept per origin.
    pub fn selected_events(&self) -> HashSet<SignatureEventSelector> {
        self.interest.as_ref().clone()
    }

    /// Shared handle on [`Engine::selected_events`] that outlives `start`.
    pub fn interest(&self) -> Arc<HashSet<SignatureEventSelector>> {
        self.interest.clone()
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        self.stats.clone()
    }

    /// Run until `stop` resolves, then close every signature.
    ///
    /// Shutdown waits for in-progress callbacks; wrap the call in a timeout
    /// if a hard deadline is needed.
    pub async fn start<F>(self, stop: F)
    where
        F: Future<Output = ()>,
    {
        let Engine { config, sources, index, loaded, rejected, diagnostics, stats, .. } = self;
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut routes = Vec::with_capacity(loaded.len());
        let mut workers = Vec::with_capacity(loaded.len());
        for Loaded { name, signature } in loaded {
            let (tx, rx) = mpsc::channel(config.signature_buffer);
            routes.push(Route { name: name.clone(), tx });

            let diagnostics = diagnostics.clone();
            let stats = stats.clone();
            workers.push(task::spawn_blocking(move || {
                worker::run(signature, name, rx, diagnostics, stats)
            }));
        }

        let dispatcher = Arc::new(Dispatcher::new(index, routes, stats.clone()));
        let readers: Vec<_> = sources
            .into_iter()
            .map(|(source, rx)| tokio::spawn(reader::run(source, rx, dispatcher.clone(), stop_rx.clone())))
            .collect();

        log::info!("engine started");
        stop.await;
        log::info!("engine stopping");
        let _ = stop_tx.send(true);

        for res in join_all(readers).await {
            if let Err(e) = res {
                log::error!("source reader failed: {e}");
            }
        }
        // Last handle on the routes: workers see end-of-queue from here on.
        drop(dispatcher);
        for res in join_all(workers).await {
            if let Err(e) = res {
                log::error!("signature worker failed: {e}");
            }
        }

        let closed = task::spawn_blocking(move || {
            for mut signature in rejected {
                signature.close();
            }
        })
        .await;
        if let Err(e) = closed {
            log::error!("closing rejected signatures failed: {e}");
        }

        log::info!("engine stopped: {:?}", stats.snapshot());
    }
}

/// Construction-time state for validating and indexing signatures.
struct Loader {
    diagnostics: Arc<Diagnostics>,
    handler: FindingHandler,
    index: SelectorIndex,
    loaded: Vec<Loaded>,
    rejected: Vec<Box<dyn Signature>>,
    ids: HashSet<String>,
}

impl Loader {
    fn load(&mut self, mut signature: Box<dyn Signature>) {
        let metadata = match signature.metadata() {
            Ok(m) => m,
            Err(e) => return self.reject(signature, format!("error getting metadata: {e:#}")),
        };
        let name = metadata.name.as_str();

        if !metadata.id.is_empty() && self.ids.contains(&metadata.id) {
            let line = format!("failed to store signature: signature \"{name}\" already loaded");
            return self.reject(signature, line);
        }

        let declared = match signature.selected_events() {
            Ok(s) => s,
            Err(e) => {
                let line = format!("error getting selected events for signature {name}: {e:#}");
                return self.reject(signature, line);
            }
        };

        let mut selectors = Vec::with_capacity(declared.len());
        for sel in &declared {
            match NormalizedSelector::try_from(sel) {
                Ok(n) => selectors.push(n),
                Err(SelectorError::MissingSource) => self
                    .diagnostics
                    .error(&format!("signature {name} doesn't declare an input source")),
                Err(SelectorError::InvalidOrigin(origin)) => self
                    .diagnostics
                    .error(&format!("signature {name} declares an invalid origin {origin}")),
            }
        }

        if let Err(e) = signature.init(self.handler.clone()) {
            let line = format!("error initializing signature {name}: {e:#}");
            return self.reject(signature, line);
        }

        let id = self.loaded.len();
        for sel in &selectors {
            self.index.insert(id, sel);
        }
        if !metadata.id.is_empty() {
            self.ids.insert(metadata.id.clone());
        }
        log::debug!("loaded signature '{name}' with {} selector(s)", selectors.len());
        self.loaded.push(Loaded { name: Arc::from(name), signature });
    }

    fn reject(&mut self, signature: Box<dyn Signature>, line: String) {
        self.diagnostics.error(&line);
        self.rejected.push(signature);
    }
}
