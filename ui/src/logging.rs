use std::fs::{File, OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_subscriber::{EnvFilter, prelude::*};

const LOG_DIR: &str = "tmp";
const LOG_BASENAME: &str = "chart_dashboard";

fn log_path() -> PathBuf {
    let ts_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let pid = std::process::id();
    let filename = format!("{LOG_BASENAME}_{ts_ms}_pid{pid}.log");
    Path::new(LOG_DIR).join(filename)
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        if let Err(err) = create_dir_all(parent) {
            eprintln!("[log] failed to create log dir {:?}: {err}", parent);
            return None;
        }
    }
    match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("[log] failed to open log file {:?}: {err}", path);
            None
        }
    }
}

/// Installs the global subscriber: stderr plus a per-process file under `tmp/`.
///
/// `RUST_LOG` wins over `default_filter`. Calling it twice is harmless; the
/// second call leaves the first subscriber in place.
pub fn init_logging(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let path = log_path();
    let file = open_log_file(&path);
    let log_file = file.as_ref().map(|_| path.display().to_string());
    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_thread_ids(true)
            .with_line_number(true)
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }
    match log_file {
        Some(log_file) => {
            tracing::info!(log_file = %log_file, filter = default_filter, "logging initialized")
        }
        None => tracing::info!(filter = default_filter, "logging initialized without a log file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unopenable_log_file_is_skipped() {
        let blocker = std::env::temp_dir().join(format!(
            "chart_dashboard_blocker_pid{}",
            std::process::id()
        ));
        std::fs::write(&blocker, b"").expect("write");

        // the parent is a regular file, so no directory can be created under it
        assert!(open_log_file(&blocker.join("run.log")).is_none());

        let writable = std::env::temp_dir().join(format!(
            "chart_dashboard_logs_pid{}/run.log",
            std::process::id()
        ));
        assert!(open_log_file(&writable).is_some());

        let _ = std::fs::remove_file(blocker);
        let _ = std::fs::remove_file(writable);
    }
}
