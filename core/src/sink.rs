use tracing::error;

use crate::DashboardError;

/// Where the dashboard reports failures it does not propagate.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &DashboardError);
}

/// Logs every report through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, err: &DashboardError) {
        error!(error = %err, "dashboard error");
    }
}
