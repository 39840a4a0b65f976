use std::{ffi::OsStr, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(level: &str) -> String {
    format!("chronomaster={level}")
}

/// Install file logging. The terminal belongs to the TUI, so without a
/// usable log file nothing is installed and events are dropped.
///
/// The returned guard must be kept alive until exit so buffered lines flush.
pub fn init(level: &str, log_file: &Path) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    let Some((dir, file_name)) = split_log_path(log_file) else {
        eprintln!("Warning: {log_file:?} does not name a log file");
        return None;
    };
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Warning: Could not create log directory {dir:?}: {e}");
        return None;
    }

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init();

    match installed {
        Ok(()) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Could not install logger: {e}");
            None
        }
    }
}

/// Directory and file name of a log path. A bare file name lives in the
/// working directory.
fn split_log_path(log_file: &Path) -> Option<(&Path, &OsStr)> {
    let file_name = log_file.file_name()?;
    let dir = log_file
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    Some((dir, file_name))
}
