use dashboard_core::{ChartKind, DashboardHandle, DashboardStatus, EngineStatus, Template};
use gpui::{App, Context, Entity, Render, Window, div, prelude::*, rgb};
use tokio::sync::watch;

use super::panels::{
    build_failed_panel, chart_panel, dashboard_header, error_banner, unavailable_panel,
    waiting_panel,
};

pub(crate) struct DashboardView {
    template: Template,
    handle: DashboardHandle,
    status: DashboardStatus,
    source: String,
}

impl DashboardView {
    pub(crate) fn new(template: Template, handle: DashboardHandle, source: String) -> Self {
        let status = handle.status().borrow().clone();
        Self {
            template,
            handle,
            status,
            source,
        }
    }

    fn apply_status(&mut self, status: DashboardStatus) {
        self.status = status;
    }
}

/// Re-renders `view` whenever the dashboard publishes a new status.
pub(crate) fn watch_status(
    view: Entity<DashboardView>,
    mut status: watch::Receiver<DashboardStatus>,
    window: &mut Window,
    cx: &mut App,
) {
    window
        .spawn(cx, async move |async_cx| {
            while status.changed().await.is_ok() {
                let next = status.borrow_and_update().clone();
                async_cx
                    .update(|window, app| {
                        let _ = view.update(app, |view, cx| {
                            view.apply_status(next);
                            cx.notify();
                        });
                        window.refresh();
                    })
                    .ok();
            }
        })
        .detach();
}

impl Render for DashboardView {
    fn render(&mut self, _window: &mut Window, _cx: &mut Context<Self>) -> impl IntoElement {
        // The markup exists from here on; the loader ignores repeats.
        self.handle.render_opportunity();

        let status = &self.status;
        let body = if let EngineStatus::Unavailable(reason) = &status.engine {
            unavailable_panel(reason).into_any_element()
        } else if status.build_failed() {
            build_failed_panel(&status.chart_errors).into_any_element()
        } else if status.charts == 0 {
            waiting_panel(status).into_any_element()
        } else {
            let mut row = div().flex().gap_3().p_3().w_full();
            for kind in ChartKind::ALL {
                row = row.child(chart_panel(kind, self.template.surface(kind).snapshot()));
            }
            row.into_any_element()
        };

        let mut root = div()
            .flex()
            .flex_col()
            .size_full()
            .bg(rgb(0x0b1220))
            .text_color(gpui::white())
            .child(dashboard_header(&self.source, status));
        if let Some(message) = &status.last_data_error {
            root = root.child(error_banner(message));
        }
        if status.charts > 0 {
            for message in &status.chart_errors {
                root = root.child(error_banner(message));
            }
        }
        root.child(div().flex_1().w_full().child(body))
    }
}
