//! Logging configuration with file-based output and size-based rotation.
//!
//! Writes logs to `~/.config/spacebar/spacebar.log` (or platform equivalent)
//! with 10 MB size-based rotation. Stdout belongs to the REPL, so there is no
//! console layer unless the log file cannot be created. Set `DEBUG_LOGGING=1`
//! to enable debug output for this crate.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Initialize logging.
///
/// Returns a `WorkerGuard` that must be held for the application lifetime so
/// buffered logs are flushed on shutdown. Falls back to stderr-only logging
/// (and returns `None`) when the log directory is unavailable.
pub fn init() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let log_dir = match dirs::config_dir() {
        Some(config) => config.join("spacebar"),
        None => {
            init_stderr_only(debug_logging);
            return None;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        // Can't use tracing yet since subscriber not initialized
        eprintln!(
            "Failed to create log directory {:?}: {}, using stderr only",
            log_dir, e
        );
        init_stderr_only(debug_logging);
        return None;
    }

    let log_path = log_dir.join("spacebar.log");
    let file_appender = match BasicRollingFileAppender::new(
        &log_path,
        RollingConditionBasic::new().max_size(MAX_LOG_SIZE),
        1,
    ) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Failed to create log file at {:?}: {}", log_path, e);
            init_stderr_only(debug_logging);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(filter(debug_logging))
        .init();

    tracing::info!(log_file = ?log_path, debug_logging, "spacebar logging initialized");

    Some(guard)
}

fn filter(debug_logging: bool) -> EnvFilter {
    if debug_logging {
        EnvFilter::new("info,spacebar=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Fallback when file logging is unavailable. Only warnings and above, to keep the REPL readable.
fn init_stderr_only(debug_logging: bool) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter = if debug_logging {
        filter(true)
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .init();

    tracing::info!(debug_logging, "spacebar logging initialized (stderr only)");
}
