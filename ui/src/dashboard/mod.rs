use std::sync::Arc;

use dashboard_core::{
    DashboardConfig, DashboardParts, ResourceLoader, Template, TracingSink, WatchConfig,
    spawn_dashboard, tokio_runtime,
};
use gpui::{App, Application, Bounds, WindowBounds, WindowOptions, prelude::*, px, size};

mod canvas;
mod panels;
mod view;

use view::{DashboardView, watch_status};

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub config: DashboardConfig,
    pub source: WatchConfig,
}

/// Opens the dashboard window. The reconciler runs on the shared tokio
/// runtime; the window only paints surfaces and offers render opportunities.
pub fn launch_dashboard(options: LaunchOptions) {
    let template = Template::new();
    let source_label = options.source.path.display().to_string();
    let handle = {
        let _guard = tokio_runtime().enter();
        spawn_dashboard(
            &options.config,
            DashboardParts {
                targets: Arc::new(template.clone()),
                loader: Arc::new(ResourceLoader),
                sink: Arc::new(TracingSink),
                source: Some(options.source),
            },
        )
    };
    let status = handle.status();

    Application::new().run(move |cx: &mut App| {
        let bounds = Bounds::centered(None, size(px(1200.), px(800.)), cx);
        cx.open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(bounds)),
                focus: true,
                ..Default::default()
            },
            move |window, cx| {
                let view = cx.new(|_| DashboardView::new(template, handle, source_label));
                watch_status(view.clone(), status, window, cx);
                view
            },
        )
        .expect("failed to open window");
        cx.activate(true);
    });
}
