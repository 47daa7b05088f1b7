use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    Dashboard, DashboardConfig, DashboardEvent, DashboardStatus, DataEvent, EngineLoader,
    ErrorSink, LibraryLoader, RenderTargets, WatchConfig, spawn_subscription,
};

pub fn tokio_runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("tokio runtime")
    })
}

/// The collaborators a dashboard is wired to.
pub struct DashboardParts {
    pub targets: Arc<dyn RenderTargets>,
    pub loader: Arc<dyn EngineLoader>,
    pub sink: Arc<dyn ErrorSink>,
    /// Data subscription; `None` when the host pushes [`DataEvent`]s itself.
    pub source: Option<WatchConfig>,
}

/// Host-side handle to a running dashboard. Dropping it tears the dashboard down.
pub struct DashboardHandle {
    events: UnboundedSender<DashboardEvent>,
    status: watch::Receiver<DashboardStatus>,
    task: Option<JoinHandle<()>>,
}

impl DashboardHandle {
    pub fn render_opportunity(&self) {
        let _ = self.events.send(DashboardEvent::RenderOpportunity);
    }

    pub fn notify(&self, event: DataEvent) {
        let _ = self.events.send(DashboardEvent::Data(event));
    }

    pub fn teardown(&self) {
        let _ = self.events.send(DashboardEvent::Teardown);
    }

    pub fn status(&self) -> watch::Receiver<DashboardStatus> {
        self.status.clone()
    }

    /// Waits until the published status satisfies `done`.
    pub async fn wait_for(
        &self,
        done: impl FnMut(&DashboardStatus) -> bool,
    ) -> Option<DashboardStatus> {
        let mut status = self.status.clone();
        let settled = status.wait_for(done).await.ok().map(|s| DashboardStatus::clone(&s));
        settled
    }

    /// Tears the dashboard down and waits for its task to finish.
    pub async fn shutdown(mut self) {
        self.teardown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for DashboardHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.teardown();
        }
    }
}

/// Starts the reconciler task (and the data subscription, if any) on the
/// current tokio runtime.
pub fn spawn_dashboard(config: &DashboardConfig, parts: DashboardParts) -> DashboardHandle {
    let (tx, rx) = unbounded_channel();
    let loader = LibraryLoader::new(parts.loader, config.engine_locator.clone())
        .with_timeout(config.load_timeout);
    let mut dashboard = Dashboard::new(parts.targets, loader, parts.sink, tx.clone());
    if let Some(source) = parts.source {
        dashboard.attach_subscription(spawn_subscription(source, tx.clone()));
    }

    let (status_tx, status_rx) = watch::channel(dashboard.status());
    let task = tokio::spawn(run(dashboard, rx, status_tx));
    DashboardHandle {
        events: tx,
        status: status_rx,
        task: Some(task),
    }
}

async fn run(
    mut dashboard: Dashboard,
    mut events: UnboundedReceiver<DashboardEvent>,
    status: watch::Sender<DashboardStatus>,
) {
    while let Some(event) = events.recv().await {
        let stop = matches!(event, DashboardEvent::Teardown);
        dashboard.handle(event);
        let next = dashboard.status();
        status.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if stop {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::testing::{CountingLoader, RecordingEngine, RecordingSink};
    use crate::{ChartKind, Dataset, EngineStatus, Phase, Record, Template};

    fn config() -> DashboardConfig {
        DashboardConfig {
            engine_locator: "builtin:test".into(),
            load_timeout: Some(Duration::from_secs(1)),
            refresh: None,
        }
    }

    #[tokio::test]
    async fn driver_joins_data_and_engine() {
        let engine = Arc::new(RecordingEngine::default());
        let loader = Arc::new(CountingLoader::succeeding(engine.clone()));
        let handle = spawn_dashboard(
            &config(),
            DashboardParts {
                targets: Arc::new(Template::new()),
                loader: loader.clone(),
                sink: Arc::new(RecordingSink::default()),
                source: None,
            },
        );

        for _ in 0..3 {
            handle.render_opportunity();
        }
        handle.notify(DataEvent::Dataset(Dataset::new(vec![
            Record::new("Prospecting", 1000.0),
            Record::new("Closed Won", 5000.0),
        ])));

        let status = timeout(Duration::from_secs(5), handle.wait_for(|s| s.charts == 3))
            .await
            .expect("charts built")
            .expect("status");
        assert_eq!(status.phase, Phase::Ready);
        assert_eq!(status.engine, EngineStatus::Ready);
        assert_eq!(status.records, 2);
        assert_eq!(loader.calls(), 1);
        assert_eq!(engine.construction_count(), 3);

        handle.shutdown().await;
        assert_eq!(engine.destroyed(), 3);
    }

    #[tokio::test]
    async fn driver_reports_unavailable_engine() {
        let sink = Arc::new(RecordingSink::default());
        let handle = spawn_dashboard(
            &config(),
            DashboardParts {
                targets: Arc::new(Template::new()),
                loader: Arc::new(CountingLoader::failing()),
                sink: sink.clone(),
                source: None,
            },
        );
        handle.render_opportunity();

        let status = timeout(Duration::from_secs(5), handle.wait_for(|s| s.is_settled()))
            .await
            .expect("settled")
            .expect("status");
        assert!(matches!(status.engine, EngineStatus::Unavailable(_)));
        assert_eq!(status.charts, 0);
        assert_eq!(sink.reports().len(), 1);
    }

    #[tokio::test]
    async fn driver_renders_file_source_with_canvas_engine() {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("chart-dashboard-driver-{nonce}.csv"));
        std::fs::write(&path, "category,amount\nProspecting,1000\nClosed Won,5000\n")
            .expect("write");

        let template = Template::new();
        let handle = spawn_dashboard(
            &DashboardConfig {
                engine_locator: crate::BUILTIN_LOCATOR.into(),
                ..config()
            },
            DashboardParts {
                targets: Arc::new(template.clone()),
                loader: Arc::new(crate::ResourceLoader),
                sink: Arc::new(RecordingSink::default()),
                source: Some(WatchConfig::new(&path)),
            },
        );
        handle.render_opportunity();

        timeout(Duration::from_secs(5), handle.wait_for(|s| s.charts == 3))
            .await
            .expect("charts built")
            .expect("status");
        for kind in ChartKind::ALL {
            let frame = template.surface(kind).snapshot().expect("frame");
            assert_eq!(frame.config.kind, kind);
            assert_eq!(frame.config.labels, ["Prospecting", "Closed Won"]);
        }

        handle.shutdown().await;
        assert!(template.surface(ChartKind::Pie).snapshot().is_none());
        let _ = std::fs::remove_file(path);
    }
}
