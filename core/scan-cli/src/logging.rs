//! Logging setup for the CLI.
//!
//! Logs go to a daily-rolling file under `~/.ticket-scan/logs` so they do not
//! interleave with the operator prompt. Falls back to stderr when the
//! directory cannot be created.

use fs_err as fs;
use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEBUG_ENV: &str = "TICKET_SCAN_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "ticket-scan.log";

pub fn init() -> Option<WorkerGuard> {
    let filter = build_filter();

    let dir = match log_dir() {
        Some(dir) => dir,
        None => {
            init_stderr(filter);
            return None;
        }
    };
    if let Err(err) = fs::create_dir_all(&dir) {
        init_stderr(filter);
        tracing::warn!(error = %err, "Failed to create log directory; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Some(guard)
}

fn build_filter() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn init_stderr(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn log_dir() -> Option<PathBuf> {
    scan_core::config::get_config_dir().map(|dir| dir.join("logs"))
}
