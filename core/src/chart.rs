use crate::{ChartKind, Series};

/// 0xRRGGBB colour, the same packing gpui's `rgb()` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

pub const PALETTE: [Rgb; 3] = [Rgb(0xff6384), Rgb(0x36a2eb), Rgb(0xffce56)];

const SERIES_LABEL: &str = "Opportunities by Stage";

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    /// Fill colours, cycled across data points.
    pub background: Vec<Rgb>,
    pub border: Option<Rgb>,
    pub border_width: f32,
    pub fill: bool,
    /// Line smoothing in `[0, 1]`; 0 draws straight segments.
    pub tension: f32,
}

impl SeriesStyle {
    pub fn color_at(&self, index: usize) -> Option<Rgb> {
        if self.background.is_empty() {
            return self.border;
        }
        Some(self.background[index % self.background.len()])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub style: SeriesStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub responsive: bool,
    pub maintain_aspect_ratio: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            maintain_aspect_ratio: false,
        }
    }
}

/// Everything an engine needs to construct one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub series: SeriesConfig,
    pub options: DisplayOptions,
}

impl ChartConfig {
    /// Builds the configuration for `kind` over the shared labels and amounts.
    pub fn for_kind(kind: ChartKind, series: &Series) -> Self {
        let style = match kind {
            ChartKind::Bar => SeriesStyle {
                background: PALETTE.to_vec(),
                border: None,
                border_width: 1.0,
                fill: true,
                tension: 0.0,
            },
            ChartKind::Line => SeriesStyle {
                background: Vec::new(),
                border: Some(PALETTE[1]),
                border_width: 2.0,
                fill: false,
                tension: 0.1,
            },
            ChartKind::Pie => SeriesStyle {
                background: PALETTE.to_vec(),
                border: None,
                border_width: 0.0,
                fill: true,
                tension: 0.0,
            },
        };
        let label = match kind {
            ChartKind::Pie => None,
            ChartKind::Bar | ChartKind::Line => Some(SERIES_LABEL.to_string()),
        };

        Self {
            kind,
            labels: series.labels.clone(),
            series: SeriesConfig {
                label,
                data: series.amounts.clone(),
                style,
            },
            options: DisplayOptions::default(),
        }
    }
}
