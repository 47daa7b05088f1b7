use polars::prelude::PolarsError;
use thiserror::Error;

use crate::ChartKind;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("column '{0}' not found")]
    MissingColumn(String),
    #[error("column lengths are inconsistent")]
    LengthMismatch,
    #[error("invalid category in column '{column}' at row {row}: {value}")]
    InvalidCategory {
        column: String,
        row: usize,
        value: String,
    },
    #[error("invalid numeric value in column '{column}' at row {row}: {value}")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },
    #[error("could not determine data format of {0} (use csv, parquet or json)")]
    UnknownFormat(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures raised by an engine loader or by the engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported engine locator '{0}'")]
    UnsupportedLocator(String),
    #[error("engine resource {locator}: {source}")]
    Resource {
        locator: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine manifest {locator}: {source}")]
    Manifest {
        locator: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("engine manifest {locator}: {reason}")]
    InvalidSettings { locator: String, reason: String },
    #[error("{labels} labels but {values} values")]
    Misaligned { labels: usize, values: usize },
    #[error("value at index {index} is not drawable: {value}")]
    InvalidValue { index: usize, value: f64 },
}

/// Everything the dashboard reports to its error sink.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("data fetch failed: {0}")]
    DataFetch(String),
    #[error("chart engine not loaded from {locator}: {source}")]
    EngineLoad {
        locator: String,
        #[source]
        source: EngineError,
    },
    #[error("chart engine load from {locator} timed out after {timeout_ms} ms")]
    EngineLoadTimeout { locator: String, timeout_ms: u128 },
    #[error("render target '{0}' not found")]
    MissingTarget(&'static str),
    #[error("failed to construct {kind} chart: {source}")]
    Construct {
        kind: ChartKind,
        #[source]
        source: EngineError,
    },
}
