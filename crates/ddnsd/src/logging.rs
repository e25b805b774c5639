//! Tracing setup
//!
//! One global subscriber: a non-blocking daily rolling file next to the
//! executable, plus stdout when a human is watching. The returned
//! [`WorkerGuard`] must live until exit so buffered lines are flushed.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable selecting the log level
pub const LOG_LEVEL_ENV: &str = "DDNS_LOG_LEVEL";

/// Log file name; rotated files get a date suffix
pub const LOG_FILE_NAME: &str = "ddns-server.log";

/// Rotated files kept on disk
pub const MAX_LOG_FILES: usize = 7;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Validate a `DDNS_LOG_LEVEL` value, `None` meaning unset
pub fn parse_log_level(raw: Option<&str>) -> Result<String> {
    let level = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .to_lowercase();

    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(level),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            level
        ),
    }
}

/// Directory holding the log file: the executable's directory, or the
/// working directory when that cannot be determined
pub fn log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_NAME)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .with_context(|| format!("Failed to open log file in {}", dir.display()))
}

/// Install the global subscriber
///
/// # Returns
///
/// The file writer's guard, or `None` when the log directory is not
/// writable (logging then falls back to stdout).
pub fn init(level: &str, interactive: bool, dir: &Path) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(level).with_context(|| format!("Invalid log filter '{}'", level))?;

    let (file_layer, guard, file_error) = match file_appender(dir) {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    // Without a file, stdout is the only place left to log to
    let stdout_layer = (interactive || file_layer.is_none()).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("Failed to set tracing subscriber")?;

    if let Some(e) = file_error {
        tracing::warn!("File logging disabled: {:#}", e);
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(parse_log_level(None).unwrap(), "info");
        assert_eq!(parse_log_level(Some("  ")).unwrap(), "info");
    }

    #[test]
    fn test_levels_are_case_insensitive() {
        assert_eq!(parse_log_level(Some("DEBUG")).unwrap(), "debug");
        assert_eq!(parse_log_level(Some("Warn")).unwrap(), "warn");
    }

    #[test]
    fn test_invalid_level_rejected() {
        let err = parse_log_level(Some("verbose")).unwrap_err();
        assert!(err.to_string().contains("DDNS_LOG_LEVEL"));
    }

    #[test]
    fn test_file_appender_writes_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(file_appender(dir.path()).is_ok());
    }
}
