use time::OffsetDateTime;

/// Which of the two preconditions are satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    DataOnly,
    EngineOnly,
    Ready,
}

impl Phase {
    pub fn from_flags(data_ready: bool, engine_ready: bool) -> Self {
        match (data_ready, engine_ready) {
            (false, false) => Phase::Init,
            (true, false) => Phase::DataOnly,
            (false, true) => Phase::EngineOnly,
            (true, true) => Phase::Ready,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    NotRequested,
    Loading,
    Ready,
    /// The load failed or timed out; charts stay unrendered for good.
    Unavailable(String),
}

/// Snapshot published to hosts after every handled event that changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStatus {
    pub phase: Phase,
    pub engine: EngineStatus,
    pub last_data_error: Option<String>,
    pub records: usize,
    pub charts: usize,
    /// Construction failures of the latest build, in bar, line, pie order.
    pub chart_errors: Vec<String>,
    pub generation: u64,
    pub data_received_at: Option<OffsetDateTime>,
    pub torn_down: bool,
}

impl DashboardStatus {
    pub fn initial() -> Self {
        Self {
            phase: Phase::Init,
            engine: EngineStatus::NotRequested,
            last_data_error: None,
            records: 0,
            charts: 0,
            chart_errors: Vec::new(),
            generation: 0,
            data_received_at: None,
            torn_down: false,
        }
    }

    /// True when a build ran and produced no chart at all.
    pub fn build_failed(&self) -> bool {
        self.generation > 0 && self.charts == 0 && !self.chart_errors.is_empty()
    }

    /// True once charts exist or can no longer appear.
    pub fn is_settled(&self) -> bool {
        self.generation > 0 || matches!(self.engine, EngineStatus::Unavailable(_)) || self.torn_down
    }
}

impl Default for DashboardStatus {
    fn default() -> Self {
        Self::initial()
    }
}
