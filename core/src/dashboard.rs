use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::{
    ChartConfig, ChartInstance, ChartKind, DashboardError, DashboardStatus, Dataset,
    EngineHandle, EngineStatus, ErrorSink, LibraryLoader, Phase, RenderTargets,
};

/// A notification from the data subscription: a dataset xor an error.
#[derive(Debug, Clone)]
pub enum DataEvent {
    Dataset(Dataset),
    Error(String),
}

/// Everything the reconciler reacts to.
pub enum DashboardEvent {
    Data(DataEvent),
    /// The host offers a chance to touch rendered markup; may repeat.
    RenderOpportunity,
    EngineLoaded(Result<EngineHandle, DashboardError>),
    Teardown,
}

/// The chart dashboard component.
///
/// Owns both readiness flags and the three chart slots. Data notifications
/// and engine-load results are handled one at a time; either may complete the
/// join, and [`Dashboard::initialize_charts`] builds the charts once both
/// halves are present.
pub struct Dashboard {
    dataset: Option<Dataset>,
    engine: Option<EngineHandle>,
    loader: LibraryLoader,
    charts: [Option<Box<dyn ChartInstance>>; 3],
    /// Why the latest build of each kind failed, if it did.
    chart_errors: [Option<String>; 3],
    targets: Arc<dyn RenderTargets>,
    sink: Arc<dyn ErrorSink>,
    events: UnboundedSender<DashboardEvent>,
    subscription: Option<JoinHandle<()>>,
    engine_status: EngineStatus,
    last_data_error: Option<String>,
    generation: u64,
    torn_down: bool,
}

impl Dashboard {
    /// `events` is the sender half of the channel feeding [`Dashboard::handle`];
    /// the engine-load result is delivered through it.
    pub fn new(
        targets: Arc<dyn RenderTargets>,
        loader: LibraryLoader,
        sink: Arc<dyn ErrorSink>,
        events: UnboundedSender<DashboardEvent>,
    ) -> Self {
        Self {
            dataset: None,
            engine: None,
            loader,
            charts: Default::default(),
            chart_errors: Default::default(),
            targets,
            sink,
            events,
            subscription: None,
            engine_status: EngineStatus::NotRequested,
            last_data_error: None,
            generation: 0,
            torn_down: false,
        }
    }

    /// Ties the data subscription task to this dashboard's lifetime.
    pub fn attach_subscription(&mut self, task: JoinHandle<()>) {
        if let Some(previous) = self.subscription.replace(task) {
            previous.abort();
        }
    }

    pub fn handle(&mut self, event: DashboardEvent) {
        if self.torn_down {
            trace!("event after teardown ignored");
            return;
        }
        match event {
            DashboardEvent::Data(data) => self.on_data(data),
            DashboardEvent::RenderOpportunity => self.on_render_opportunity(),
            DashboardEvent::EngineLoaded(result) => self.on_engine_loaded(result),
            DashboardEvent::Teardown => self.teardown(),
        }
    }

    pub fn on_data(&mut self, event: DataEvent) {
        if self.torn_down {
            return;
        }
        match event {
            DataEvent::Dataset(dataset) => {
                debug!(records = dataset.len(), "dataset received");
                self.dataset = Some(dataset);
                self.last_data_error = None;
                self.initialize_charts();
            }
            DataEvent::Error(message) => {
                let err = DashboardError::DataFetch(message);
                self.sink.report(&err);
                self.last_data_error = Some(err.to_string());
            }
        }
    }

    pub fn on_render_opportunity(&mut self) {
        if self.torn_down {
            return;
        }
        if self.loader.request(&self.events) {
            self.engine_status = EngineStatus::Loading;
        }
    }

    pub fn on_engine_loaded(&mut self, result: Result<EngineHandle, DashboardError>) {
        if self.torn_down {
            return;
        }
        match result {
            Ok(engine) => {
                info!(engine = engine.name(), "chart engine ready");
                self.loader.settle(true);
                self.engine = Some(engine);
                self.engine_status = EngineStatus::Ready;
                self.initialize_charts();
            }
            Err(err) => {
                self.loader.settle(false);
                self.sink.report(&err);
                self.engine_status = EngineStatus::Unavailable(err.to_string());
            }
        }
    }

    /// Builds all three charts when both the dataset and the engine are
    /// present; otherwise does nothing. Returns how many charts were built.
    ///
    /// Every call that passes the gate rebuilds every chart. A new instance
    /// replaces the old one only after it was constructed, and the old one is
    /// destroyed on replacement. A kind that fails keeps its previous instance
    /// and records the failure in [`DashboardStatus::chart_errors`].
    pub fn initialize_charts(&mut self) -> usize {
        if self.torn_down {
            return 0;
        }
        let (Some(dataset), Some(engine)) = (&self.dataset, &self.engine) else {
            trace!(phase = ?self.phase(), "chart initialization waiting");
            return 0;
        };
        let series = dataset.series();
        let engine = Arc::clone(engine);
        self.generation += 1;

        let mut built = 0;
        for kind in ChartKind::ALL {
            let Some(surface) = self.targets.resolve(kind.target_id()) else {
                self.record_failure(kind, DashboardError::MissingTarget(kind.target_id()));
                continue;
            };
            let config = ChartConfig::for_kind(kind, &series);
            match engine.create_chart(&surface, &config) {
                Ok(chart) => {
                    if let Some(mut previous) = self.charts[kind.slot()].replace(chart) {
                        previous.destroy();
                    }
                    self.chart_errors[kind.slot()] = None;
                    built += 1;
                }
                Err(source) => self.record_failure(kind, DashboardError::Construct { kind, source }),
            }
        }
        info!(
            generation = self.generation,
            records = series.len(),
            built,
            "charts initialized"
        );
        built
    }

    fn record_failure(&mut self, kind: ChartKind, err: DashboardError) {
        self.sink.report(&err);
        self.chart_errors[kind.slot()] = Some(err.to_string());
    }

    /// Cancels pending work, destroys every chart and drops the engine and
    /// dataset. Later events are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.loader.cancel();
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
        for slot in &mut self.charts {
            if let Some(mut chart) = slot.take() {
                chart.destroy();
            }
        }
        self.engine = None;
        self.dataset = None;
        if self.engine_status == EngineStatus::Loading {
            warn!(locator = self.loader.locator(), "torn down while engine was loading");
        }
        debug!("dashboard torn down");
    }

    pub fn is_data_ready(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn is_engine_ready(&self) -> bool {
        self.engine.is_some()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_flags(self.is_data_ready(), self.is_engine_ready())
    }

    pub fn chart(&self, kind: ChartKind) -> Option<&dyn ChartInstance> {
        self.charts[kind.slot()].as_deref()
    }

    pub fn status(&self) -> DashboardStatus {
        DashboardStatus {
            phase: self.phase(),
            engine: self.engine_status.clone(),
            last_data_error: self.last_data_error.clone(),
            records: self.dataset.as_ref().map_or(0, Dataset::len),
            charts: self.charts.iter().filter(|c| c.is_some()).count(),
            chart_errors: self.chart_errors.iter().flatten().cloned().collect(),
            generation: self.generation,
            data_received_at: self.dataset.as_ref().map(Dataset::received_at),
            torn_down: self.torn_down,
        }
    }
}
