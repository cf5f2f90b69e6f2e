use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default number of days a run log is kept.
pub const LOG_RETENTION_DAYS: i64 = 90;

/// Prefix of run log file names
const LOG_FILE_PREFIX: &str = "acgen_";

/// Console verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogLevel {
    #[default]
    Info,
    Debug,
    Error,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Error => "error",
        }
    }
}

/// Where and how much to log
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Directory for per-run log files; `None` logs to stderr only
    pub dir: Option<PathBuf>,
    pub retention_days: i64,
}

/// Install the global subscriber: stderr at the configured level (overridable
/// with `RUST_LOG`) plus a plain-text file capturing debug and above.
/// Returns the log file path when one was opened.
pub fn init(config: &LogConfig) -> Option<PathBuf> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.directive()));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, log_path) = match config.dir.as_deref().map(open_log_file) {
        Some(Ok((file, path))) => {
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(path))
        }
        Some(Err(e)) => {
            eprintln!("warning: could not open log file: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    // A subscriber may already be installed (tests, embedding); keep it
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();

    if let Some(dir) = &config.dir {
        prune_old_logs(dir, config.retention_days, Utc::now());
    }
    log_path
}

/// Create the log directory and a fresh timestamped log file in it.
fn open_log_file(dir: &Path) -> std::io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(Utc::now()));
    let file = File::options().create(true).append(true).open(&path)?;
    Ok((file, path))
}

pub fn log_file_name(now: DateTime<Utc>) -> String {
    format!("{}{}.log", LOG_FILE_PREFIX, now.format("%Y-%m-%dT%H-%M-%S%.3f"))
}

/// Delete run logs in `dir` last modified more than `retention_days` before
/// `now`. Failures are logged and skipped. Returns the deleted paths.
pub fn prune_old_logs(dir: &Path, retention_days: i64, now: DateTime<Utc>) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "could not list log directory");
            return removed;
        }
    };
    let cutoff = now - chrono::Duration::days(retention_days);

    for entry in entries.flatten() {
        let path = entry.path();
        let is_run_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(".log"));
        if !is_run_log {
            continue;
        }
        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(t) => DateTime::<Utc>::from(t),
            Err(_) => continue,
        };
        if modified >= cutoff {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(file = %path.display(), "deleted old log file");
                removed.push(path);
            }
            Err(e) => tracing::warn!(file = %path.display(), error = %e, "could not delete old log file"),
        }
    }
    removed
}
