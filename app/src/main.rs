use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dashboard_core::{
    ColumnMapping, DashboardConfig, DashboardParts, DashboardStatus, DataFormat, EngineStatus,
    LoadOptions, ResourceLoader, Template, TracingSink, WatchConfig, spawn_dashboard,
    tokio_runtime,
};
use dashboard_ui::{LaunchOptions, init_logging, launch_dashboard};
use tracing::{info, warn};

mod headless;
mod input;
use input::InputFormat;

#[derive(Parser, Debug)]
#[command(name = "chart-dashboard")]
struct Args {
    /// Path to the CSV, Parquet or JSON file with category and amount columns.
    path: PathBuf,

    /// Explicitly set the file format. If omitted, inferred from extension.
    #[arg(long, value_enum)]
    format: Option<InputFormat>,

    /// Chart engine locator: `builtin:canvas` or a JSON manifest path.
    #[arg(long)]
    engine: Option<String>,

    /// Give up on the chart engine after this many milliseconds (0 waits forever).
    #[arg(long)]
    load_timeout_ms: Option<u64>,

    /// Re-read the data file when it changes, polling every N seconds.
    #[arg(long)]
    refresh_secs: Option<u64>,

    #[arg(long)]
    category_column: Option<String>,

    #[arg(long)]
    amount_column: Option<String>,

    /// Print the charts as text instead of opening a window.
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging("info");

    let format = args
        .format
        .map(DataFormat::from)
        .or_else(|| DataFormat::detect(&args.path));
    if format.is_none() {
        bail!("could not determine file format of {} (use --format)", args.path.display());
    }

    let config = dashboard_config(&args, DashboardConfig::default());
    let source = watch_config(&args, format, config.refresh);
    info!(
        path = %source.path.display(),
        engine = %config.engine_locator,
        headless = args.headless,
        "starting chart dashboard"
    );

    if args.headless {
        return run_headless(config, source);
    }
    launch_dashboard(LaunchOptions { config, source });
    Ok(())
}

/// Applies command-line overrides on top of the environment defaults.
fn dashboard_config(args: &Args, mut config: DashboardConfig) -> DashboardConfig {
    if let Some(engine) = &args.engine {
        config.engine_locator = engine.clone();
    }
    if let Some(ms) = args.load_timeout_ms {
        config.load_timeout = (ms > 0).then(|| Duration::from_millis(ms));
    }
    if let Some(secs) = args.refresh_secs {
        config.refresh = (secs > 0).then(|| Duration::from_secs(secs));
    }
    config
}

fn watch_config(
    args: &Args,
    format: Option<DataFormat>,
    refresh: Option<Duration>,
) -> WatchConfig {
    let defaults = ColumnMapping::default();
    WatchConfig {
        path: args.path.clone(),
        format,
        options: LoadOptions {
            columns: ColumnMapping {
                category: args.category_column.clone().unwrap_or(defaults.category),
                amount: args.amount_column.clone().unwrap_or(defaults.amount),
            },
        },
        refresh,
    }
}

fn run_headless(config: DashboardConfig, source: WatchConfig) -> Result<()> {
    let template = Template::new();
    let source = WatchConfig {
        refresh: None,
        ..source
    };

    let (status, text) = tokio_runtime().block_on(async {
        let handle = spawn_dashboard(
            &config,
            DashboardParts {
                targets: Arc::new(template.clone()),
                loader: Arc::new(ResourceLoader),
                sink: Arc::new(TracingSink),
                source: Some(source),
            },
        );
        handle.render_opportunity();
        let status = handle
            .wait_for(|s| s.is_settled() || s.last_data_error.is_some())
            .await;
        // Surfaces are released on teardown.
        let text = headless::render_template(&template);
        handle.shutdown().await;
        (status, text)
    });

    let status = status.context("dashboard stopped before settling")?;
    check_outcome(&status)?;
    print!("{text}");
    Ok(())
}

/// Fails the headless run unless at least one chart was built.
fn check_outcome(status: &DashboardStatus) -> Result<()> {
    if let EngineStatus::Unavailable(reason) = &status.engine {
        bail!("charts unavailable: {reason}");
    }
    if status.charts == 0 {
        if status.build_failed() {
            bail!("no chart could be built: {}", status.chart_errors.join("; "));
        }
        if let Some(message) = &status.last_data_error {
            bail!("{message}");
        }
        bail!("no chart was built");
    }
    for message in &status.chart_errors {
        warn!("{message}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use dashboard_core::Phase;

    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).expect("valid arguments")
    }

    fn base() -> DashboardConfig {
        DashboardConfig {
            engine_locator: "builtin:canvas".into(),
            load_timeout: Some(Duration::from_secs(10)),
            refresh: None,
        }
    }

    #[test]
    fn flags_override_environment_defaults() {
        let args = parse(&[
            "chart-dashboard",
            "data.csv",
            "--engine",
            "engine.json",
            "--load-timeout-ms",
            "250",
            "--refresh-secs",
            "5",
        ]);
        let config = dashboard_config(&args, base());
        assert_eq!(config.engine_locator, "engine.json");
        assert_eq!(config.load_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.refresh, Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_disables_timeout_and_refresh() {
        let args = parse(&[
            "chart-dashboard",
            "data.csv",
            "--load-timeout-ms",
            "0",
            "--refresh-secs",
            "0",
        ]);
        let config = dashboard_config(&args, base());
        assert_eq!(config.load_timeout, None);
        assert_eq!(config.refresh, None);
    }

    #[test]
    fn headless_fails_when_every_chart_is_rejected() {
        let mut status = DashboardStatus {
            phase: Phase::Ready,
            engine: EngineStatus::Ready,
            generation: 1,
            chart_errors: vec![
                "failed to construct bar chart: value at index 0 is not drawable: NaN".into(),
            ],
            ..DashboardStatus::initial()
        };
        let err = check_outcome(&status).expect_err("no charts");
        assert!(err.to_string().starts_with("no chart could be built"));

        status.charts = 2;
        assert!(check_outcome(&status).is_ok());
    }

    #[test]
    fn headless_reports_unavailable_engine() {
        let status = DashboardStatus {
            engine: EngineStatus::Unavailable("timed out".into()),
            ..DashboardStatus::initial()
        };
        let err = check_outcome(&status).expect_err("unavailable");
        assert_eq!(err.to_string(), "charts unavailable: timed out");
    }

    #[test]
    fn column_flags_rename_mapping() {
        let args = parse(&[
            "chart-dashboard",
            "deals.json",
            "--format",
            "json",
            "--category-column",
            "StageName",
        ]);
        let format = args.format.map(DataFormat::from);
        let source = watch_config(&args, format, None);
        assert_eq!(source.format, Some(DataFormat::Json));
        assert_eq!(source.options.columns.category, "StageName");
        assert_eq!(source.options.columns.amount, "amount");
    }
}
