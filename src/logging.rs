//! File logging, plus an optional stderr echo for long-running commands

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::paths;

const LOG_LEVEL_ENV: &str = "TASKMASTER_LOG_LEVEL";
const LOG_FILE_PREFIX: &str = "taskmaster-";
const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct LogOptions {
    /// Also print `info` and above to stderr (used by `serve`).
    pub console: bool,
}

pub fn init_logging(options: LogOptions) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = paths::log_dir();
    fs::create_dir_all(&log_dir)?;
    let log_file_path = get_log_file_path(&log_dir);

    let (writer, guard) = tracing_appender::non_blocking(fs::File::create(&log_file_path)?);
    // Dropping the guard stops the writer thread; keep it for the process lifetime.
    std::mem::forget(guard);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_filter(log_filter(std::env::var(LOG_LEVEL_ENV).ok().as_deref()));

    let console_layer = options.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!(path = %log_file_path.display(), "logging initialized");
    Ok(log_file_path)
}

fn log_filter(raw_level: Option<&str>) -> EnvFilter {
    let level = raw_level
        .and_then(normalize_log_level)
        .unwrap_or(DEFAULT_LEVEL);
    EnvFilter::new(format!("{level},taskmaster={level}"))
}

fn normalize_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

pub fn get_log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    log_dir.join(format!("{LOG_FILE_PREFIX}{timestamp}.log"))
}

pub fn print_log_location(log_path: &Path) {
    eprintln!();
    eprintln!("  Log file: {}", log_path.display());
    eprintln!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_file_path() {
        let dir = PathBuf::from("/tmp/test-logs");
        let path = get_log_file_path(&dir);
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("log file name");
        assert!(name.starts_with("taskmaster-"));
        assert!(name.ends_with(".log"));
        assert!(path.starts_with(&dir));
    }

    #[test]
    fn test_normalize_log_level() {
        assert_eq!(normalize_log_level("DEBUG"), Some("debug"));
        assert_eq!(normalize_log_level(" warning "), Some("warn"));
        assert_eq!(normalize_log_level("loud"), None);
    }

    #[test]
    fn test_log_filter_falls_back_to_warn() {
        assert_eq!(log_filter(Some("loud")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(Some("info")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
