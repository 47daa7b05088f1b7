mod canvas;
mod chart;
mod config;
mod dashboard;
mod engine;
mod error;
mod load;
mod loader;
mod runtime;
mod sink;
mod source;
mod status;
mod surface;
#[cfg(test)]
mod testing;
mod types;

pub use canvas::{BUILTIN_LOCATOR, CanvasChart, CanvasEngine, EngineSettings, ResourceLoader};
pub use chart::{ChartConfig, DisplayOptions, PALETTE, Rgb, SeriesConfig, SeriesStyle};
pub use config::{DEFAULT_LOAD_TIMEOUT_MS, DashboardConfig};
pub use dashboard::{Dashboard, DashboardEvent, DataEvent};
pub use engine::{ChartEngine, ChartInstance, EngineHandle, EngineLoader, LoadFuture};
pub use error::{DashboardError, EngineError, LoadError};
pub use load::{load_csv, load_dataset, load_json, load_parquet, parse_json};
pub use loader::LibraryLoader;
pub use runtime::{DashboardHandle, DashboardParts, spawn_dashboard, tokio_runtime};
pub use sink::{ErrorSink, TracingSink};
pub use source::{WatchConfig, spawn_subscription, watch_dataset};
pub use status::{DashboardStatus, EngineStatus, Phase};
pub use surface::{Frame, RenderTargets, Shape, Surface, Template};
pub use types::{ChartKind, ColumnMapping, DataFormat, Dataset, LoadOptions, Record, Series};
