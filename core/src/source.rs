use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{DashboardEvent, DataEvent, DataFormat, LoadOptions, load_dataset};

/// A pre-aggregated dataset file standing in for the backend query.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub path: PathBuf,
    pub format: Option<DataFormat>,
    pub options: LoadOptions,
    /// Poll interval for modifications; `None` pushes one notification.
    pub refresh: Option<Duration>,
}

impl WatchConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            options: LoadOptions::default(),
            refresh: None,
        }
    }
}

/// Pushes the file's dataset, then a fresh notification every time its
/// modification time changes. After a failed load every poll retries. Returns once the receiver is gone or, without a
/// refresh interval, after the first notification.
pub async fn watch_dataset(cfg: WatchConfig, sender: UnboundedSender<DashboardEvent>) {
    let mut seen: Option<Option<SystemTime>> = None;
    loop {
        let modified = modified_at(&cfg).await;
        if seen != Some(modified) {
            let event = load_event(&cfg).await;
            // a failed read is retried on the next poll even if the file is untouched
            seen = match event {
                DataEvent::Dataset(_) => Some(modified),
                DataEvent::Error(_) => None,
            };
            if sender.send(DashboardEvent::Data(event)).is_err() {
                return;
            }
        }
        let Some(refresh) = cfg.refresh else {
            return;
        };
        tokio::time::sleep(refresh).await;
    }
}

pub fn spawn_subscription(
    cfg: WatchConfig,
    sender: UnboundedSender<DashboardEvent>,
) -> JoinHandle<()> {
    tokio::spawn(watch_dataset(cfg, sender))
}

async fn modified_at(cfg: &WatchConfig) -> Option<SystemTime> {
    tokio::fs::metadata(&cfg.path)
        .await
        .and_then(|meta| meta.modified())
        .ok()
}

async fn load_event(cfg: &WatchConfig) -> DataEvent {
    let path = cfg.path.clone();
    let format = cfg.format;
    let options = cfg.options.clone();
    let task = tokio::task::spawn_blocking(move || load_dataset(&path, format, &options));
    match task.await {
        Ok(Ok(dataset)) => {
            debug!(path = %cfg.path.display(), records = dataset.len(), "dataset loaded");
            DataEvent::Dataset(dataset)
        }
        Ok(Err(err)) => DataEvent::Error(format!("failed to load {}: {err}", cfg.path.display())),
        Err(err) => DataEvent::Error(format!("load task for {} failed: {err}", cfg.path.display())),
    }
}
