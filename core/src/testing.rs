//! Recording doubles for the dashboard's collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::{
    ChartConfig, ChartEngine, ChartInstance, ChartKind, DashboardError, EngineError,
    EngineHandle, EngineLoader, ErrorSink, LoadFuture, Surface,
};

#[derive(Default)]
pub(crate) struct RecordingEngine {
    pub constructions: Mutex<Vec<(String, ChartConfig)>>,
    pub destroyed: Arc<AtomicUsize>,
    pub fail_kind: Option<ChartKind>,
}

impl RecordingEngine {
    pub fn failing_on(kind: ChartKind) -> Self {
        Self {
            fail_kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn construction_count(&self) -> usize {
        self.constructions.lock().expect("lock").len()
    }

    pub fn constructed(&self) -> Vec<(String, ChartConfig)> {
        self.constructions.lock().expect("lock").clone()
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl ChartEngine for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_chart(
        &self,
        surface: &Surface,
        config: &ChartConfig,
    ) -> Result<Box<dyn ChartInstance>, EngineError> {
        if self.fail_kind == Some(config.kind) {
            return Err(EngineError::InvalidValue {
                index: 0,
                value: f64::NAN,
            });
        }
        self.constructions
            .lock()
            .expect("lock")
            .push((surface.id().to_string(), config.clone()));
        Ok(Box::new(RecordedChart {
            kind: config.kind,
            target: surface.id(),
            destroyed: Arc::clone(&self.destroyed),
            live: true,
        }))
    }
}

struct RecordedChart {
    kind: ChartKind,
    target: &'static str,
    destroyed: Arc<AtomicUsize>,
    live: bool,
}

impl ChartInstance for RecordedChart {
    fn kind(&self) -> ChartKind {
        self.kind
    }

    fn target(&self) -> &str {
        self.target
    }

    fn destroy(&mut self) {
        if std::mem::take(&mut self.live) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

enum Outcome {
    Succeed(Arc<RecordingEngine>),
    Fail,
    Hang(Mutex<Option<oneshot::Sender<()>>>),
}

pub(crate) struct CountingLoader {
    calls: AtomicUsize,
    outcome: Outcome,
}

impl CountingLoader {
    pub fn succeeding(engine: Arc<RecordingEngine>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Outcome::Succeed(engine),
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Outcome::Fail,
        }
    }

    /// Never resolves; `probe` is dropped when the pending load is dropped.
    pub fn hanging(probe: oneshot::Sender<()>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Outcome::Hang(Mutex::new(Some(probe))),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EngineLoader for CountingLoader {
    fn load(&self, locator: &str) -> LoadFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Succeed(engine) => {
                let engine: EngineHandle = engine.clone();
                Box::pin(async move { Ok::<_, EngineError>(engine) })
            }
            Outcome::Fail => {
                let locator = locator.to_string();
                Box::pin(async move {
                    Err::<EngineHandle, _>(EngineError::UnsupportedLocator(locator))
                })
            }
            Outcome::Hang(probe) => {
                let probe = probe.lock().expect("lock").take();
                Box::pin(async move {
                    let _probe = probe;
                    std::future::pending::<Result<EngineHandle, EngineError>>().await
                })
            }
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    reports: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().expect("lock").clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report(&self, error: &DashboardError) {
        self.reports.lock().expect("lock").push(error.to_string());
    }
}
