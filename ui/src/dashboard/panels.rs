use dashboard_core::{ChartConfig, ChartKind, DashboardStatus, Frame, Phase};
use gpui::{Div, SharedString, div, prelude::*, px, rgb};
use time::macros::format_description;

use super::canvas::frame_canvas;

pub(super) fn dashboard_header(source: &str, status: &DashboardStatus) -> impl IntoElement {
    let updated = status
        .data_received_at
        .and_then(|at| at.format(format_description!("[hour]:[minute]:[second]")).ok())
        .unwrap_or_else(|| "-".to_string());

    div()
        .flex()
        .justify_between()
        .items_center()
        .p_3()
        .bg(rgb(0x111827))
        .border_b_1()
        .border_color(rgb(0x1f2937))
        .child(
            div()
                .text_sm()
                .child(SharedString::from(source.to_string())),
        )
        .child(
            div()
                .flex()
                .gap_3()
                .text_sm()
                .child(format!("records: {}", status.records))
                .child(format!("charts: {}", status.charts))
                .child(format!("updated: {updated}")),
        )
}

/// Shown for good when the chart engine could not be loaded.
pub(super) fn unavailable_panel(reason: &str) -> impl IntoElement {
    failure_panel(
        "Charts unavailable",
        "The chart engine failed to load.",
        &[reason.to_string()],
    )
}

/// Shown while the latest build produced no chart at all.
pub(super) fn build_failed_panel(errors: &[String]) -> impl IntoElement {
    failure_panel(
        "Charts could not be built",
        "The chart engine rejected the current dataset.",
        errors,
    )
}

fn failure_panel(title: &'static str, detail: &'static str, reasons: &[String]) -> Div {
    let mut reasons_box = div()
        .flex()
        .flex_col()
        .gap_1()
        .max_w(px(640.))
        .p_4()
        .rounded_md()
        .bg(rgb(0x111827))
        .border_1()
        .border_color(rgb(0x1f2937));
    for reason in reasons {
        reasons_box = reasons_box.child(SharedString::from(reason.clone()));
    }

    div()
        .flex()
        .flex_col()
        .items_center()
        .justify_center()
        .gap_4()
        .p_8()
        .w_full()
        .h_full()
        .text_center()
        .child(div().text_lg().child(title))
        .child(div().text_sm().text_color(rgb(0x9ca3af)).child(detail))
        .child(reasons_box)
}

pub(super) fn waiting_panel(status: &DashboardStatus) -> impl IntoElement {
    let message = match status.phase {
        Phase::Init => "Loading chart engine and data...",
        Phase::DataOnly => "Loading chart engine...",
        Phase::EngineOnly => "Waiting for data...",
        Phase::Ready => "Building charts...",
    };
    div()
        .flex()
        .items_center()
        .justify_center()
        .w_full()
        .h_full()
        .text_sm()
        .text_color(rgb(0x9ca3af))
        .child(message)
}

pub(super) fn error_banner(message: &str) -> impl IntoElement {
    div()
        .px_3()
        .py_2()
        .bg(rgb(0x1f2937))
        .border_b_1()
        .border_color(rgb(0xef4444))
        .text_sm()
        .text_color(rgb(0xef4444))
        .child(SharedString::from(message.to_string()))
}

pub(super) fn chart_panel(kind: ChartKind, frame: Option<Frame>) -> Div {
    let title = match kind {
        ChartKind::Bar => "Bar",
        ChartKind::Line => "Line",
        ChartKind::Pie => "Pie",
    };
    let legend = frame.as_ref().map(legend);

    let panel = div()
        .flex()
        .flex_col()
        .flex_1()
        .gap_2()
        .p_3()
        .rounded_md()
        .bg(rgb(0x111827))
        .border_1()
        .border_color(rgb(0x1f2937))
        .child(div().text_sm().child(title))
        .child(div().w_full().h(px(280.)).child(frame_canvas(frame).size_full()));

    match legend {
        Some(legend) => panel.child(legend),
        None => panel,
    }
}

fn legend(frame: &Frame) -> Div {
    let config = &frame.config;
    let mut row = div().flex().flex_wrap().gap_2().text_xs();
    for (i, label) in config.labels.iter().enumerate() {
        let color = legend_color(config, i);
        row = row.child(
            div()
                .flex()
                .items_center()
                .gap_1()
                .child(div().w(px(10.)).h(px(10.)).rounded_sm().bg(rgb(color)))
                .child(format!("{label}: {}", format_amount(config.series.data[i]))),
        );
    }
    row
}

fn legend_color(config: &ChartConfig, index: usize) -> u32 {
    let style = &config.series.style;
    let color = match config.kind {
        ChartKind::Line => style.border.or_else(|| style.color_at(index)),
        ChartKind::Bar | ChartKind::Pie => style.color_at(index),
    };
    color.map_or(0x9ca3af, |c| c.0)
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
