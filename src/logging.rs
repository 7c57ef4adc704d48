//! Process-wide logging setup: a human-readable stream on stderr, plus a
//! dedicated file sink that only collects warnings and above (in practice,
//! worker-thread panics; see `worker_pool`).
//!
//! The error-log filename embeds the epoch second the process started, so
//! two runs never clobber each other's log. That timestamp is captured
//! once, here, at startup — not per log line.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Must be kept alive for the lifetime of the process: dropping it stops
/// the background thread that flushes buffered log lines to the error file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global `tracing` subscriber. Call once, at the very start
/// of `main`, before spawning the server.
pub fn init() -> LoggingGuard {
    let epoch_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let file_name = format!("bulkmt_error_{epoch_secs}.log");

    let file_appender = tracing_appender::rolling::never(".", file_name);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    LoggingGuard {
        _file_guard: file_guard,
    }
}
