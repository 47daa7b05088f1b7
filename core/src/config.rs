use std::time::Duration;

use crate::canvas::BUILTIN_LOCATOR;

pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Passed to the engine loader on the first render opportunity.
    pub engine_locator: String,
    /// `None` waits for the engine indefinitely.
    pub load_timeout: Option<Duration>,
    /// Poll interval of the data subscription; `None` loads once.
    pub refresh: Option<Duration>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            engine_locator: std::env::var("CHART_ENGINE")
                .unwrap_or_else(|_| BUILTIN_LOCATOR.into()),
            load_timeout: Some(Duration::from_millis(
                env_u64("CHART_LOAD_TIMEOUT_MS").unwrap_or(DEFAULT_LOAD_TIMEOUT_MS),
            ))
            .filter(|d| !d.is_zero()),
            refresh: env_u64("CHART_REFRESH_SECS")
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}
