use std::fmt::Write;

use dashboard_core::{ChartKind, Frame, Template};

const BAR_WIDTH: usize = 40;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Text rendering of every surface in the template, in bar, line, pie order.
pub fn render_template(template: &Template) -> String {
    let mut out = String::new();
    for kind in ChartKind::ALL {
        let surface = template.surface(kind);
        let _ = writeln!(out, "[{}] {kind}", surface.id());
        match surface.snapshot() {
            Some(frame) => out.push_str(&render_frame(&frame)),
            None => out.push_str("  (empty)\n"),
        }
    }
    out
}

pub fn render_frame(frame: &Frame) -> String {
    let config = &frame.config;
    let values = &config.series.data;
    let width = config.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = String::new();

    match config.kind {
        ChartKind::Bar => {
            let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            for (label, value) in config.labels.iter().zip(values) {
                let len = if max > 0.0 {
                    ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
                } else {
                    0
                };
                let _ = writeln!(out, "  {label:<width$} {} {value}", "#".repeat(len));
            }
        }
        ChartKind::Line => {
            let _ = writeln!(out, "  {}", sparkline(values));
            for (label, value) in config.labels.iter().zip(values) {
                let _ = writeln!(out, "  {label:<width$} {value}");
            }
        }
        ChartKind::Pie => {
            let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
            for (label, value) in config.labels.iter().zip(values) {
                let share = if total > 0.0 {
                    value.max(0.0) / total * 100.0
                } else {
                    0.0
                };
                let _ = writeln!(out, "  {label:<width$} {share:>5.1}%");
            }
        }
    }
    out
}

fn sparkline(values: &[f64]) -> String {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let span = max - min;
    values
        .iter()
        .map(|v| {
            if span > 0.0 {
                let step = ((v - min) / span * (SPARKS.len() - 1) as f64).round() as usize;
                SPARKS[step.min(SPARKS.len() - 1)]
            } else {
                SPARKS[SPARKS.len() / 2]
            }
        })
        .collect()
}
