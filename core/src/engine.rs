use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{ChartConfig, ChartKind, EngineError, Surface};

/// The rendering engine the dashboard constructs its charts with.
pub trait ChartEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Constructs a chart bound to `surface`.
    fn create_chart(
        &self,
        surface: &Surface,
        config: &ChartConfig,
    ) -> Result<Box<dyn ChartInstance>, EngineError>;
}

/// A constructed chart. Instances are replaced, never patched; `destroy`
/// releases whatever the engine holds for it and must be idempotent.
pub trait ChartInstance: Send {
    fn kind(&self) -> ChartKind;
    fn target(&self) -> &str;
    fn destroy(&mut self);
}

pub type EngineHandle = Arc<dyn ChartEngine>;

pub type LoadFuture = Pin<Box<dyn Future<Output = Result<EngineHandle, EngineError>> + Send>>;

/// One-shot asynchronous engine loading.
pub trait EngineLoader: Send + Sync {
    fn load(&self, locator: &str) -> LoadFuture;
}
