use std::sync::{Arc, Mutex, MutexGuard};

use crate::{ChartConfig, ChartKind, Rgb};

/// Geometry in unit coordinates: `(0, 0)` is the top-left corner of the
/// target, `(1, 1)` the bottom-right. Hosts scale it to their own bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    Polyline {
        points: Vec<(f32, f32)>,
        width: f32,
        color: Rgb,
    },
    Polygon {
        points: Vec<(f32, f32)>,
        color: Rgb,
    },
}

/// What a chart instance has drawn onto a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub owner: u64,
    pub config: ChartConfig,
    pub shapes: Vec<Shape>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    frame: Option<Frame>,
    revision: u64,
}

/// A drawable slot in the component's markup, located by a stable id.
#[derive(Debug, Clone)]
pub struct Surface {
    id: &'static str,
    state: Arc<Mutex<SurfaceState>>,
}

impl Surface {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(SurfaceState::default())),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn present(&self, frame: Frame) {
        let mut state = self.lock();
        state.frame = Some(frame);
        state.revision += 1;
    }

    /// Clears the surface if `owner` drew the current frame.
    pub fn release(&self, owner: u64) -> bool {
        let mut state = self.lock();
        if state.frame.as_ref().is_some_and(|f| f.owner == owner) {
            state.frame = None;
            state.revision += 1;
            true
        } else {
            false
        }
    }

    pub fn snapshot(&self) -> Option<Frame> {
        self.lock().frame.clone()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    // A panic while drawing leaves the frame intact, so the poison is ignored.
    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resolves render targets by id.
pub trait RenderTargets: Send + Sync {
    fn resolve(&self, id: &str) -> Option<Surface>;
}

/// The component's markup: one surface per chart kind.
#[derive(Debug, Clone)]
pub struct Template {
    surfaces: [Surface; 3],
}

impl Template {
    pub fn new() -> Self {
        Self {
            surfaces: ChartKind::ALL.map(|kind| Surface::new(kind.target_id())),
        }
    }

    pub fn surface(&self, kind: ChartKind) -> &Surface {
        &self.surfaces[kind.slot()]
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTargets for Template {
    fn resolve(&self, id: &str) -> Option<Surface> {
        self.surfaces.iter().find(|s| s.id() == id).cloned()
    }
}
