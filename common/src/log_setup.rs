use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAX_LOG_FILES: usize = 5;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LogSetupError {
    #[error("Invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Failed to create log directory '{path}': {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create log file appender in '{path}': {source}")]
    Appender {
        path: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    #[error("Logging is already initialized")]
    AlreadyInitialized,
}

/// Log destinations for one process.
#[derive(Debug, Clone, Copy)]
pub struct LogOptions<'a> {
    /// Filter used when `RUST_LOG` is unset, e.g. `"info"` or `"pfinder=debug"`.
    pub base_level: &'a str,
    /// File name prefix of the rotated log files.
    pub file_prefix: &'a str,
    /// Directory for daily-rotated log files. Console only when `None`.
    pub log_dir: Option<&'a Path>,
}

/// Installs the global subscriber.
///
/// Console output goes to stdout; warnings and errors go to stderr instead.
/// With a `log_dir`, a plain-text copy is written to
/// `<file_prefix>.<date>.log`, keeping the last few days.
pub fn setup_logging(options: LogOptions<'_>) -> Result<(), LogSetupError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(options.base_level).map_err(|source| LogSetupError::Filter {
            filter: options.base_level.to_string(),
            source,
        })?,
    };

    let console_writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = match options.log_dir {
        Some(dir) => Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(file_writer(dir, options.file_prefix)?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogSetupError::AlreadyInitialized)
}

fn file_writer(
    dir: &Path,
    file_prefix: &str,
) -> Result<tracing_appender::non_blocking::NonBlocking, LogSetupError> {
    std::fs::create_dir_all(dir).map_err(|source| LogSetupError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|source| LogSetupError::Appender {
            path: dir.to_path_buf(),
            source,
        })?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    LOG_GUARD
        .set(guard)
        .map_err(|_| LogSetupError::AlreadyInitialized)?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_reported() {
        // Only reached when RUST_LOG is unset or itself invalid.
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = setup_logging(LogOptions {
            base_level: "pfinder=loud",
            file_prefix: "test",
            log_dir: None,
        })
        .unwrap_err();
        assert!(matches!(err, LogSetupError::Filter { .. }));
        assert!(err.to_string().contains("pfinder=loud"));
    }
}
