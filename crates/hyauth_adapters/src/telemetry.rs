use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use hyauth_core::Error;
use tracing::subscriber::set_global_default;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Where the daily rolling log files go
pub fn log_directory() -> PathBuf {
    ProjectDirs::from("com", "hyauth", "hyauth")
        .map(|d| d.data_local_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber: human-readable stderr output plus a plain
/// daily log file. `RUST_LOG` wins over `env_filter` when set.
///
/// Keep the returned guard alive until exit or buffered file output is lost.
pub fn init_subscriber(name: &str, env_filter: &str) -> Result<WorkerGuard, Error> {
    init_subscriber_in(name, env_filter, &log_directory())
}

/// Same as [`init_subscriber`], writing log files under `log_dir`
pub fn init_subscriber_in(
    name: &str,
    env_filter: &str,
    log_dir: &Path,
) -> Result<WorkerGuard, Error> {
    LogTracer::init().map_err(|e| Error::Other(format!("failed to bridge log records: {}", e)))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    // stdout carries tokens and JSON output, so logs stay on stderr
    let formatting_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .pretty();

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(name)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| Error::Other(format!("failed to open log file: {}", e)))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(formatting_layer)
        .with(file_layer);

    set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("failed to set global tracing subscriber: {}", e)))?;

    Ok(guard)
}
