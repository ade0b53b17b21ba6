//! Logging setup
//!
//! Plain commands log to stderr. The TUI owns the terminal, so it only logs
//! when `--debug` is given, and then to a daily rolling file.

use std::fs;
use std::io;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

const LOG_FILE: &str = "leadfunnel.log";

/// Filter from `RUST_LOG`, falling back to the configured level
fn env_filter(config: &LoggingConfig, debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { config.level.as_str() };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Log to stderr for non-interactive commands
pub fn init(config: &LoggingConfig, debug: bool) -> Result<()> {
    let filter = env_filter(config, debug);
    let layer = if config.json {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("Failed to initialize logging")
}

/// Log to `<log dir>/leadfunnel.log.<date>` while the TUI runs.
///
/// Returns `None` (no logging at all) unless `debug` is set. Keep the guard
/// alive until exit so buffered lines are flushed.
pub fn init_tui(config: &LoggingConfig, debug: bool) -> Result<Option<WorkerGuard>> {
    if !debug {
        return Ok(None);
    }

    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = env_filter(config, debug);
    let layer = if config.json {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .json()
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_line_number(true)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::info!("Debug logging to {:?}", log_dir.join(LOG_FILE));
    Ok(Some(guard))
}
