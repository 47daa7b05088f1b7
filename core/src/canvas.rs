//! The bundled chart engine: turns a [`ChartConfig`] into unit-space geometry
//! and presents it on the target [`Surface`].

use std::f32::consts::{FRAC_PI_2, TAU};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use tracing::debug;

use crate::{
    ChartConfig, ChartEngine, ChartInstance, ChartKind, EngineError, EngineHandle, EngineLoader,
    Frame, LoadFuture, Rgb, Shape, Surface,
};

pub const BUILTIN_LOCATOR: &str = "builtin:canvas";

const FALLBACK_COLOR: Rgb = Rgb(0x9ca3af);

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Arc segments used for a full circle.
    pub pie_segments: u32,
    /// Fraction of each bar slot left empty.
    pub bar_gap: f32,
    /// Points sampled per line segment when tension is non-zero.
    pub line_samples: u32,
    pub padding: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pie_segments: 96,
            bar_gap: 0.3,
            line_samples: 8,
            padding: 0.05,
        }
    }
}

impl EngineSettings {
    pub const MAX_PIE_SEGMENTS: u32 = 1024;
    pub const MAX_LINE_SAMPLES: u32 = 64;

    /// Rejects settings that would invert the layout or grow it without bound.
    pub fn validate(&self) -> Result<(), String> {
        if !(3..=Self::MAX_PIE_SEGMENTS).contains(&self.pie_segments) {
            return Err(format!(
                "pie_segments must be in 3..={}, got {}",
                Self::MAX_PIE_SEGMENTS,
                self.pie_segments
            ));
        }
        if !(1..=Self::MAX_LINE_SAMPLES).contains(&self.line_samples) {
            return Err(format!(
                "line_samples must be in 1..={}, got {}",
                Self::MAX_LINE_SAMPLES,
                self.line_samples
            ));
        }
        if !(0.0..0.5).contains(&self.padding) {
            return Err(format!("padding must be in [0, 0.5), got {}", self.padding));
        }
        if !(0.0..1.0).contains(&self.bar_gap) {
            return Err(format!("bar_gap must be in [0, 1), got {}", self.bar_gap));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CanvasEngine {
    settings: EngineSettings,
}

impl CanvasEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn layout(&self, config: &ChartConfig) -> Result<Vec<Shape>, EngineError> {
        validate(config)?;
        let shapes = match config.kind {
            ChartKind::Bar => bar_shapes(config, &self.settings),
            ChartKind::Line => line_shapes(config, &self.settings),
            ChartKind::Pie => pie_shapes(config, &self.settings),
        };
        Ok(shapes)
    }
}

impl ChartEngine for CanvasEngine {
    fn name(&self) -> &str {
        "canvas"
    }

    fn create_chart(
        &self,
        surface: &Surface,
        config: &ChartConfig,
    ) -> Result<Box<dyn ChartInstance>, EngineError> {
        let shapes = self.layout(config)?;
        let owner = NEXT_OWNER.fetch_add(1, Ordering::Relaxed);
        surface.present(Frame {
            owner,
            config: config.clone(),
            shapes,
        });
        debug!(surface = surface.id(), kind = %config.kind, owner, "chart presented");
        Ok(Box::new(CanvasChart {
            kind: config.kind,
            surface: surface.clone(),
            owner,
            live: true,
        }))
    }
}

pub struct CanvasChart {
    kind: ChartKind,
    surface: Surface,
    owner: u64,
    live: bool,
}

impl ChartInstance for CanvasChart {
    fn kind(&self) -> ChartKind {
        self.kind
    }

    fn target(&self) -> &str {
        self.surface.id()
    }

    fn destroy(&mut self) {
        if std::mem::take(&mut self.live) {
            self.surface.release(self.owner);
        }
    }
}

impl Drop for CanvasChart {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Resolves `builtin:canvas` or a path to a JSON [`EngineSettings`] manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResourceLoader;

impl EngineLoader for ResourceLoader {
    fn load(&self, locator: &str) -> LoadFuture {
        let locator = locator.to_string();
        Box::pin(async move {
            if locator == BUILTIN_LOCATOR {
                return Ok(Arc::new(CanvasEngine::default()) as EngineHandle);
            }
            if locator.starts_with("builtin:") {
                return Err(EngineError::UnsupportedLocator(locator));
            }
            let raw = tokio::fs::read_to_string(&locator)
                .await
                .map_err(|source| EngineError::Resource {
                    locator: locator.clone(),
                    source,
                })?;
            let settings: EngineSettings =
                serde_json::from_str(&raw).map_err(|source| EngineError::Manifest {
                    locator: locator.clone(),
                    source,
                })?;
            settings
                .validate()
                .map_err(|reason| EngineError::InvalidSettings {
                    locator: locator.clone(),
                    reason,
                })?;
            Ok(Arc::new(CanvasEngine::new(settings)) as EngineHandle)
        })
    }
}

fn validate(config: &ChartConfig) -> Result<(), EngineError> {
    let data = &config.series.data;
    if config.labels.len() != data.len() {
        return Err(EngineError::Misaligned {
            labels: config.labels.len(),
            values: data.len(),
        });
    }
    for (index, &value) in data.iter().enumerate() {
        let drawable = value.is_finite() && (config.kind != ChartKind::Pie || value >= 0.0);
        if !drawable {
            return Err(EngineError::InvalidValue { index, value });
        }
    }
    Ok(())
}

/// Maps values onto the vertical axis; the range always includes zero.
struct ValueScale {
    min: f64,
    range: f64,
    pad: f32,
}

impl ValueScale {
    fn new(values: &[f64], pad: f32) -> Self {
        let min = values.iter().copied().fold(0.0_f64, f64::min);
        let max = values.iter().copied().fold(0.0_f64, f64::max);
        let range = if max > min { max - min } else { 1.0 };
        Self { min, range, pad }
    }

    fn y(&self, value: f64) -> f32 {
        let normalized = ((value - self.min) / self.range).clamp(0.0, 1.0) as f32;
        self.pad + (1.0 - normalized) * (1.0 - 2.0 * self.pad)
    }
}

fn slot_width(count: usize, pad: f32) -> f32 {
    (1.0 - 2.0 * pad) / count.max(1) as f32
}

fn bar_shapes(config: &ChartConfig, settings: &EngineSettings) -> Vec<Shape> {
    let data = &config.series.data;
    let pad = settings.padding;
    let scale = ValueScale::new(data, pad);
    let slot = slot_width(data.len(), pad);
    let gap = settings.bar_gap.clamp(0.0, 0.9);
    let style = &config.series.style;

    data.iter()
        .enumerate()
        .map(|(i, &value)| {
            let top = scale.y(value.max(0.0));
            let bottom = scale.y(value.min(0.0));
            Shape::Rect {
                x: pad + i as f32 * slot + slot * gap * 0.5,
                y: top,
                w: slot * (1.0 - gap),
                h: (bottom - top).max(f32::EPSILON),
                color: style.color_at(i).unwrap_or(FALLBACK_COLOR),
            }
        })
        .collect()
}

fn line_shapes(config: &ChartConfig, settings: &EngineSettings) -> Vec<Shape> {
    let data = &config.series.data;
    if data.is_empty() {
        return Vec::new();
    }
    let pad = settings.padding;
    let scale = ValueScale::new(data, pad);
    let slot = slot_width(data.len(), pad);
    let style = &config.series.style;
    let color = style
        .border
        .or_else(|| style.color_at(0))
        .unwrap_or(FALLBACK_COLOR);

    let knots: Vec<(f32, f32)> = data
        .iter()
        .enumerate()
        .map(|(i, &v)| (pad + (i as f32 + 0.5) * slot, scale.y(v)))
        .collect();
    let points = smooth(&knots, style.tension, settings.line_samples);

    let mut shapes = Vec::with_capacity(2);
    if style.fill && points.len() > 1 {
        let baseline = scale.y(0.0);
        let mut area = points.clone();
        if let (Some(&(last_x, _)), Some(&(first_x, _))) = (points.last(), points.first()) {
            area.push((last_x, baseline));
            area.push((first_x, baseline));
        }
        shapes.push(Shape::Polygon {
            points: area,
            color: style.color_at(0).unwrap_or(color),
        });
    }
    shapes.push(Shape::Polyline {
        points,
        width: style.border_width.max(1.0),
        color,
    });
    shapes
}

/// Cardinal-spline interpolation through `knots`; `tension` 0 keeps them as is.
fn smooth(knots: &[(f32, f32)], tension: f32, samples: u32) -> Vec<(f32, f32)> {
    if tension <= 0.0 || knots.len() < 3 || samples < 2 {
        return knots.to_vec();
    }
    let tangent = |i: usize| {
        let prev = knots[i.saturating_sub(1)];
        let next = knots[(i + 1).min(knots.len() - 1)];
        ((next.0 - prev.0) * tension, (next.1 - prev.1) * tension)
    };

    let mut out = Vec::with_capacity((knots.len() - 1) * samples as usize + 1);
    for i in 0..knots.len() - 1 {
        let (p0, p1) = (knots[i], knots[i + 1]);
        let (m0, m1) = (tangent(i), tangent(i + 1));
        for s in 0..samples {
            let t = s as f32 / samples as f32;
            let (t2, t3) = (t * t, t * t * t);
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            out.push((
                h00 * p0.0 + h10 * m0.0 + h01 * p1.0 + h11 * m1.0,
                (h00 * p0.1 + h10 * m0.1 + h01 * p1.1 + h11 * m1.1).clamp(0.0, 1.0),
            ));
        }
    }
    if let Some(&last) = knots.last() {
        out.push(last);
    }
    out
}

fn pie_shapes(config: &ChartConfig, settings: &EngineSettings) -> Vec<Shape> {
    let data = &config.series.data;
    let total: f64 = data.iter().sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let center = (0.5_f32, 0.5_f32);
    let radius = 0.5 - settings.padding;
    let style = &config.series.style;

    let mut start = -FRAC_PI_2;
    let mut shapes = Vec::with_capacity(data.len());
    for (i, &value) in data.iter().enumerate() {
        let sweep = (value / total) as f32 * TAU;
        if sweep <= 0.0 {
            continue;
        }
        let steps = ((settings.pie_segments.max(3) as f32 * sweep / TAU).ceil() as usize).max(2);
        let mut points = Vec::with_capacity(steps + 2);
        points.push(center);
        for s in 0..=steps {
            let angle = start + sweep * s as f32 / steps as f32;
            points.push((
                center.0 + radius * angle.cos(),
                center.1 + radius * angle.sin(),
            ));
        }
        shapes.push(Shape::Polygon {
            points,
            color: style.color_at(i).unwrap_or(FALLBACK_COLOR),
        });
        start += sweep;
    }
    shapes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PALETTE, Series};

    fn config(kind: ChartKind, amounts: &[f64]) -> ChartConfig {
        let series = Series {
            labels: (0..amounts.len()).map(|i| format!("s{i}")).collect(),
            amounts: amounts.to_vec(),
        };
        ChartConfig::for_kind(kind, &series)
    }

    fn in_unit_space(points: &[(f32, f32)]) -> bool {
        points
            .iter()
            .all(|&(x, y)| (-1e-4..=1.0001).contains(&x) && (-1e-4..=1.0001).contains(&y))
    }

    #[test]
    fn bars_scale_to_the_largest_value() {
        let engine = CanvasEngine::default();
        let shapes = engine
            .layout(&config(ChartKind::Bar, &[1000.0, 5000.0]))
            .expect("layout");
        assert_eq!(shapes.len(), 2);

        let heights: Vec<f32> = shapes
            .iter()
            .map(|s| match s {
                Shape::Rect { h, .. } => *h,
                other => panic!("unexpected shape {other:?}"),
            })
            .collect();
        assert!((heights[1] / heights[0] - 5.0).abs() < 1e-3);
        assert!(matches!(shapes[0], Shape::Rect { color, .. } if color == PALETTE[0]));
        assert!(matches!(shapes[1], Shape::Rect { color, .. } if color == PALETTE[1]));
    }

    #[test]
    fn line_passes_through_every_knot() {
        let engine = CanvasEngine::default();
        let shapes = engine
            .layout(&config(ChartKind::Line, &[3.0, 1.0, 4.0, 1.0]))
            .expect("layout");
        let [Shape::Polyline { points, color, .. }] = shapes.as_slice() else {
            panic!("expected one polyline, got {shapes:?}");
        };
        assert_eq!(*color, PALETTE[1]);
        assert_eq!(points.len(), 3 * 8 + 1);
        assert!(in_unit_space(points));
        // every `line_samples`-th point is an original knot
        let knots: Vec<_> = points.iter().step_by(8).collect();
        assert_eq!(knots.len(), 4);
        assert!(knots[1].1 > knots[0].1, "smaller value sits lower on screen");
    }

    #[test]
    fn pie_wedges_cover_the_circle() {
        let engine = CanvasEngine::default();
        let shapes = engine
            .layout(&config(ChartKind::Pie, &[1.0, 1.0, 2.0]))
            .expect("layout");
        assert_eq!(shapes.len(), 3);
        for shape in &shapes {
            let Shape::Polygon { points, .. } = shape else {
                panic!("expected polygon");
            };
            assert_eq!(points[0], (0.5, 0.5));
            assert!(in_unit_space(points));
        }
        // the last wedge ends where the first began (top of the circle)
        let Shape::Polygon { points, .. } = &shapes[2] else {
            unreachable!()
        };
        let end = points.last().copied().expect("end");
        assert!((end.0 - 0.5).abs() < 1e-3);
        assert!((end.1 - 0.05).abs() < 1e-3);
    }

    #[test]
    fn pie_of_zero_total_draws_nothing() {
        let engine = CanvasEngine::default();
        let shapes = engine
            .layout(&config(ChartKind::Pie, &[0.0, 0.0]))
            .expect("layout");
        assert!(shapes.is_empty());
    }

    #[test]
    fn rejects_undrawable_values() {
        let engine = CanvasEngine::default();
        let err = engine
            .layout(&config(ChartKind::Bar, &[1.0, f64::NAN]))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue { index: 1, .. }));

        let err = engine
            .layout(&config(ChartKind::Pie, &[1.0, -2.0]))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue { index: 1, .. }));

        let mut misaligned = config(ChartKind::Line, &[1.0, 2.0]);
        misaligned.labels.pop();
        let err = engine.layout(&misaligned).unwrap_err();
        assert!(matches!(err, EngineError::Misaligned { labels: 1, values: 2 }));
    }

    #[test]
    fn destroying_a_chart_clears_its_surface_once() {
        let engine = CanvasEngine::default();
        let surface = Surface::new("barChart");
        let mut chart = engine
            .create_chart(&surface, &config(ChartKind::Bar, &[1.0]))
            .expect("chart");
        assert_eq!(chart.target(), "barChart");
        assert!(surface.snapshot().is_some());

        chart.destroy();
        assert!(surface.snapshot().is_none());
        let revision = surface.revision();
        chart.destroy();
        drop(chart);
        assert_eq!(surface.revision(), revision);
    }

    #[test]
    fn stale_chart_does_not_clear_its_replacement() {
        let engine = CanvasEngine::default();
        let surface = Surface::new("lineChart");
        let old = engine
            .create_chart(&surface, &config(ChartKind::Line, &[1.0, 2.0]))
            .expect("old");
        let _new = engine
            .create_chart(&surface, &config(ChartKind::Line, &[2.0, 3.0]))
            .expect("new");
        drop(old);
        let frame = surface.snapshot().expect("replacement still drawn");
        assert_eq!(frame.config.series.data, [2.0, 3.0]);
    }

    #[tokio::test]
    async fn resource_loader_resolves_builtin_and_manifests() {
        let engine = ResourceLoader.load(BUILTIN_LOCATOR).await.expect("builtin");
        assert_eq!(engine.name(), "canvas");

        let err = ResourceLoader.load("builtin:webgl").await.err().expect("unsupported");
        assert!(matches!(err, EngineError::UnsupportedLocator(_)));

        let missing = std::env::temp_dir().join("chart-dashboard-missing-engine.json");
        let err = ResourceLoader
            .load(&missing.display().to_string())
            .await
            .err()
            .expect("missing");
        assert!(matches!(err, EngineError::Resource { .. }));

        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let manifest = std::env::temp_dir().join(format!("chart-dashboard-engine-{nonce}.json"));
        std::fs::write(&manifest, r#"{"pie_segments": 12}"#).expect("write");
        let engine = ResourceLoader
            .load(&manifest.display().to_string())
            .await
            .expect("manifest");
        assert_eq!(engine.name(), "canvas");

        std::fs::write(&manifest, "not json").expect("write");
        let err = ResourceLoader
            .load(&manifest.display().to_string())
            .await
            .err()
            .expect("malformed");
        assert!(matches!(err, EngineError::Manifest { .. }));

        for bad in [
            r#"{"padding": 0.5}"#,
            r#"{"pie_segments": 4000000000}"#,
            r#"{"line_samples": 0}"#,
            r#"{"bar_gap": 1.5}"#,
        ] {
            std::fs::write(&manifest, bad).expect("write");
            let err = ResourceLoader
                .load(&manifest.display().to_string())
                .await
                .err()
                .expect("out of range");
            assert!(
                matches!(err, EngineError::InvalidSettings { .. }),
                "{bad} gave {err}"
            );
        }
        let _ = std::fs::remove_file(manifest);
    }

    #[test]
    fn default_settings_are_valid() {
        assert_eq!(EngineSettings::default().validate(), Ok(()));
        let negative = EngineSettings {
            padding: -0.1,
            ..EngineSettings::default()
        };
        assert!(negative.validate().is_err());
    }
}
