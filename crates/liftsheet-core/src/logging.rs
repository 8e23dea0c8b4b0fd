use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::config_directory;

const LOG_FILE_NAME: &str = "liftsheet.log";
const LOG_ENV_VAR: &str = "LIFTSHEET_LOG";
const DEFAULT_FILTER: &str = "info";

/// Controls where structured logs are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingDestination {
    /// Human-readable events on stderr plus JSON events in the per-user log file.
    FileAndStderr,
    /// Human-readable events on stderr only.
    StderrOnly,
}

#[derive(Debug)]
struct LoggingGuards {
    _guard: Option<WorkerGuard>,
    log_path: Option<PathBuf>,
}

static LOGGING_STATE: OnceLock<LoggingGuards> = OnceLock::new();

/// Errors that can arise while standing up structured logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to prepare log directory: {0}")]
    Io(#[from] io::Error),
    #[error("invalid logging filter: {0}")]
    Filter(#[from] ParseError),
    #[error("failed to install logging subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global structured logging subscriber.
///
/// The first call wins; subsequent calls are no-ops that return the resolved log file path.
pub fn init_logging(
    destination: LoggingDestination,
) -> Result<Option<&'static PathBuf>, LoggingError> {
    if LOGGING_STATE.get().is_none() {
        let guards = install_logging(destination)?;
        if let Err(guards) = LOGGING_STATE.set(guards) {
            drop(guards);
        }
    }

    Ok(current_log_path())
}

/// Returns the log file path selected during logging initialization (if any).
pub fn current_log_path() -> Option<&'static PathBuf> {
    LOGGING_STATE
        .get()
        .and_then(|guards| guards.log_path.as_ref())
}

/// Directory holding the JSON log file.
pub fn log_directory() -> PathBuf {
    config_directory().join("logs")
}

fn install_logging(destination: LoggingDestination) -> Result<LoggingGuards, LoggingError> {
    let filter = build_filter()?;

    let (file_layer, guard, log_path) = match destination {
        LoggingDestination::FileAndStderr => {
            let dir = log_directory();
            fs::create_dir_all(&dir)?;
            let path = dir.join(LOG_FILE_NAME);
            let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
            let (writer, worker_guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .event_format(
                    tracing_subscriber::fmt::format()
                        .json()
                        .with_timer(UtcTime::rfc_3339())
                        .with_level(true)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with_writer(writer)
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(worker_guard), Some(path))
        }
        LoggingDestination::StderrOnly => (None, None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_timer(LocalTime::rfc_3339())
                .with_level(true)
                .with_target(true)
                .with_ansi(false),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .boxed();

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    if let Some(path) = log_path.as_ref() {
        info!(path = %path.display(), "Structured logging enabled");
    }

    Ok(LoggingGuards {
        _guard: guard,
        log_path,
    })
}

fn build_filter() -> Result<EnvFilter, ParseError> {
    match filter_directive(|name| env::var(name).ok()) {
        Some((LOG_ENV_VAR, directive)) => EnvFilter::try_new(directive),
        // A malformed RUST_LOG belongs to other tools too, so it only falls back.
        Some((_, directive)) => {
            EnvFilter::try_new(directive).or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        }
        None => EnvFilter::try_new(DEFAULT_FILTER),
    }
}

/// First non-blank filter directive, checking `LIFTSHEET_LOG` before `RUST_LOG`.
fn filter_directive(lookup: impl Fn(&str) -> Option<String>) -> Option<(&'static str, String)> {
    [LOG_ENV_VAR, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .find_map(|name| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (name, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| vars.get(name).map(|value| value.to_string())
    }

    #[test]
    fn liftsheet_log_wins_over_rust_log() {
        let lookup = lookup_from(&[
            ("LIFTSHEET_LOG", "liftsheet_core=trace"),
            ("RUST_LOG", "warn"),
        ]);
        assert_eq!(
            filter_directive(lookup),
            Some((LOG_ENV_VAR, "liftsheet_core=trace".to_string()))
        );
    }

    #[test]
    fn blank_liftsheet_log_defers_to_rust_log() {
        let lookup = lookup_from(&[("LIFTSHEET_LOG", "  "), ("RUST_LOG", "debug")]);
        assert_eq!(
            filter_directive(lookup),
            Some(("RUST_LOG", "debug".to_string()))
        );
    }

    #[test]
    fn no_directive_means_default_level() {
        assert_eq!(filter_directive(lookup_from(&[])), None);
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn log_file_lives_under_config_directory() {
        assert_eq!(log_directory(), config_directory().join("logs"));
    }
}
