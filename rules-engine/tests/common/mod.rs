//! Test doubles shared by the engine integration tests.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::{self, Write},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
        mpsc as std_mpsc,
    },
    time::Duration,
};

use anyhow::anyhow;
use rules::shared::{Event, Finding, Signal, SignatureEventSelector, SignatureMetadata};
use rules::{Config, Engine, EngineStats, FindingHandler, Signature};
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::timeout,
};

pub const WAIT: Duration = Duration::from_secs(2);
pub const QUIET: Duration = Duration::from_millis(150);

/// In-memory diagnostics sink that can be read while the engine runs.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, b: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(b);
        Ok(b.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

pub fn sel(source: &str, name: &str, origin: &str) -> SignatureEventSelector {
    SignatureEventSelector::new(source, name, origin)
}

/// What a test can observe about a [`FakeSignature`].
pub struct Probe {
    pub events: mpsc::UnboundedReceiver<Event>,
    pub signals: mpsc::UnboundedReceiver<Signal>,
    pub closed: Arc<AtomicUsize>,
}

impl Probe {
    pub async fn next_event(&mut self) -> Event {
        timeout(WAIT, self.events.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("signature dropped")
    }

    /// Asserts nothing more arrives for a short while.
    pub async fn assert_no_event(&mut self) {
        if let Ok(Some(ev)) = timeout(QUIET, self.events.recv()).await {
            panic!("unexpected delivery: {:?}", ev.headers);
        }
    }

    pub async fn next_signal(&mut self) -> Signal {
        timeout(WAIT, self.signals.recv())
            .await
            .expect("timed out waiting for a signal")
            .expect("signature dropped")
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Configurable signature, in the spirit of a table-driven fake.
pub struct FakeSignature {
    metadata: Result<SignatureMetadata, String>,
    selectors: Result<Vec<SignatureEventSelector>, String>,
    init_error: Option<String>,
    event_error: Option<String>,
    event_panic: Option<String>,
    signal_error: Option<String>,
    publish_findings: bool,
    gate: Option<std_mpsc::Receiver<()>>,
    handler: Option<FindingHandler>,
    events: mpsc::UnboundedSender<Event>,
    signals: mpsc::UnboundedSender<Signal>,
    closed: Arc<AtomicUsize>,
}

impl FakeSignature {
    pub fn new(name: &str) -> (Self, Probe) {
        let (ev_tx, ev_rx) = mpsc::unbounded_channel();
        let (sig_tx, sig_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicUsize::new(0));
        let fake = Self {
            metadata: Ok(SignatureMetadata { name: name.into(), ..Default::default() }),
            selectors: Ok(Vec::new()),
            init_error: None,
            event_error: None,
            event_panic: None,
            signal_error: None,
            publish_findings: false,
            gate: None,
            handler: None,
            events: ev_tx,
            signals: sig_tx,
            closed: closed.clone(),
        };
        (fake, Probe { events: ev_rx, signals: sig_rx, closed })
    }

    pub fn with_id(mut self, id: &str) -> Self {
        if let Ok(m) = &mut self.metadata {
            m.id = id.into();
        }
        self
    }

    pub fn selecting(mut self, selectors: Vec<SignatureEventSelector>) -> Self {
        self.selectors = Ok(selectors);
        self
    }

    pub fn failing_metadata(mut self, err: &str) -> Self {
        self.metadata = Err(err.into());
        self
    }

    pub fn failing_selected_events(mut self, err: &str) -> Self {
        self.selectors = Err(err.into());
        self
    }

    pub fn failing_init(mut self, err: &str) -> Self {
        self.init_error = Some(err.into());
        self
    }

    pub fn failing_events(mut self, err: &str) -> Self {
        self.event_error = Some(err.into());
        self
    }

    pub fn panicking_events(mut self, msg: &str) -> Self {
        self.event_panic = Some(msg.into());
        self
    }

    pub fn failing_signals(mut self, err: &str) -> Self {
        self.signal_error = Some(err.into());
        self
    }

    pub fn publishing(mut self) -> Self {
        self.publish_findings = true;
        self
    }

    /// Every `on_event` blocks until the returned sender is dropped.
    pub fn gated(mut self) -> (Self, std_mpsc::Sender<()>) {
        let (tx, rx) = std_mpsc::channel();
        self.gate = Some(rx);
        (self, tx)
    }

    pub fn boxed(self) -> Box<dyn Signature> {
        Box::new(self)
    }
}

impl Signature for FakeSignature {
    fn metadata(&self) -> anyhow::Result<SignatureMetadata> {
        self.metadata.clone().map_err(|e| anyhow!(e))
    }

    fn selected_events(&self) -> anyhow::Result<Vec<SignatureEventSelector>> {
        self.selectors.clone().map_err(|e| anyhow!(e))
    }

    fn init(&mut self, handler: FindingHandler) -> anyhow::Result<()> {
        if let Some(e) = &self.init_error {
            return Err(anyhow!(e.clone()));
        }
        self.handler = Some(handler);
        Ok(())
    }

    fn on_event(&mut self, event: &Event) -> anyhow::Result<()> {
        let _ = self.events.send(event.clone());
        if let Some(gate) = &self.gate {
            // Returns once the test drops the sender.
            let _ = gate.recv();
        }
        if self.publish_findings {
            let handler = self.handler.as_ref().ok_or_else(|| anyhow!("not initialised"))?;
            let metadata = self.metadata.clone().map_err(|e| anyhow!(e))?;
            handler.publish(Finding {
                data: [("hit".to_owned(), serde_json::json!(true))].into(),
                event: event.clone(),
                metadata,
            })?;
        }
        if let Some(msg) = &self.event_panic {
            panic!("{msg}");
        }
        match &self.event_error {
            Some(e) => Err(anyhow!(e.clone())),
            None => Ok(()),
        }
    }

    fn on_signal(&mut self, signal: &Signal) -> anyhow::Result<()> {
        let _ = self.signals.send(signal.clone());
        match &self.signal_error {
            Some(e) => Err(anyhow!(e.clone())),
            None => Ok(()),
        }
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// A running engine wired to one `"tracee"` source queue.
pub struct Harness {
    pub input: mpsc::Sender<rules::shared::Event>,
    pub findings: mpsc::Receiver<Finding>,
    pub diagnostics: SharedBuf,
    pub stats: Arc<EngineStats>,
    stop: oneshot::Sender<()>,
    run: JoinHandle<()>,
}

impl Harness {
    pub fn start(signatures: Vec<Box<dyn Signature>>) -> Self {
        Self::start_with(signatures, Config::default())
    }

    pub fn start_with(signatures: Vec<Box<dyn Signature>>, config: Config) -> Self {
        let (engine, input, findings, diagnostics) = build(signatures, config);
        let stats = engine.stats();
        let (stop, stop_rx) = oneshot::channel::<()>();
        let run = tokio::spawn(engine.start(async move {
            let _ = stop_rx.await;
        }));
        Self { input, findings, diagnostics, stats, stop, run }
    }

    pub async fn send(&self, event: impl Into<Event>) {
        self.input.send(event.into()).await.expect("engine input closed");
    }

    /// Stop the engine and wait for every signature to be closed.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        timeout(WAIT, self.run)
            .await
            .expect("engine did not stop in time")
            .expect("engine task panicked");
    }
}

/// Engine plus the channel ends a test needs, without starting it.
pub fn build(
    signatures: Vec<Box<dyn Signature>>,
    config: Config,
) -> (Engine, mpsc::Sender<Event>, mpsc::Receiver<Finding>, SharedBuf) {
    let (input, input_rx) = config.source_channel();
    let (out_tx, out_rx) = mpsc::channel(16);
    let diagnostics = SharedBuf::default();
    let sources = HashMap::from([("tracee".to_owned(), input_rx)]);
    let engine = Engine::new(signatures, sources, out_tx, diagnostics.clone(), config)
        .expect("constructing engine");
    (engine, input, out_rx, diagnostics)
}
