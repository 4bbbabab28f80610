use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::{AppPaths, LoggingConfig};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs stdout logging plus a daily-rolling file under `paths.log_dir`.
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(paths: &AppPaths, logging: &LoggingConfig) {
    let log_dir = &paths.log_dir;
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, &logging.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&logging.level).unwrap_or_else(|err| {
            eprintln!(
                "Invalid log level '{}': {}; falling back to info",
                logging.level, err
            );
            EnvFilter::new("info")
        })
    });

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init();
    if let Err(err) = result {
        eprintln!("Logging already initialized: {}", err);
    }
}
