use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{DashboardError, DashboardEvent, EngineLoader};

enum LoadState {
    Idle,
    Pending(JoinHandle<()>),
    Loaded,
    Failed,
}

/// Loads the chart engine at most once per dashboard.
pub struct LibraryLoader {
    loader: Arc<dyn EngineLoader>,
    locator: String,
    timeout: Option<Duration>,
    state: LoadState,
}

impl LibraryLoader {
    pub fn new(loader: Arc<dyn EngineLoader>, locator: impl Into<String>) -> Self {
        Self {
            loader,
            locator: locator.into(),
            timeout: None,
            state: LoadState::Idle,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn is_requested(&self) -> bool {
        !matches!(self.state, LoadState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, LoadState::Pending(_))
    }

    /// Issues the load unless one was already requested. The outcome comes
    /// back through `events` as [`DashboardEvent::EngineLoaded`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, events: &UnboundedSender<DashboardEvent>) -> bool {
        if self.is_requested() {
            debug!(locator = %self.locator, "engine load already requested");
            return false;
        }

        info!(locator = %self.locator, timeout = ?self.timeout, "loading chart engine");
        let load = self.loader.load(&self.locator);
        let locator = self.locator.clone();
        let timeout = self.timeout;
        let events = events.clone();
        let task = tokio::spawn(async move {
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, load).await {
                    Ok(result) => result.map_err(|source| DashboardError::EngineLoad {
                        locator: locator.clone(),
                        source,
                    }),
                    Err(_) => Err(DashboardError::EngineLoadTimeout {
                        locator: locator.clone(),
                        timeout_ms: limit.as_millis(),
                    }),
                },
                None => load
                    .await
                    .map_err(|source| DashboardError::EngineLoad { locator, source }),
            };
            let _ = events.send(DashboardEvent::EngineLoaded(outcome));
        });
        self.state = LoadState::Pending(task);
        true
    }

    pub(crate) fn settle(&mut self, loaded: bool) {
        self.state = if loaded {
            LoadState::Loaded
        } else {
            LoadState::Failed
        };
    }

    /// Aborts a pending load. A cancelled loader never loads again.
    pub(crate) fn cancel(&mut self) {
        if let LoadState::Pending(task) = &self.state {
            task.abort();
            self.state = LoadState::Failed;
            debug!(locator = %self.locator, "pending engine load aborted");
        }
    }
}
