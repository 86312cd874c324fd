//! Logging bootstrap
//!
//! Stdout logging filtered by `logging.level`, plus a daily-rolling file when
//! `logging.file` is configured.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global subscriber
///
/// Keep the returned guard alive for as long as file logging should flush.
/// Calling this again after a subscriber is installed is a no-op.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let log_filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(log_filter);

    if let Some(log_file) = &config.file {
        let log_path = Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path
            .parent()
            .and_then(|p| p.to_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(".");
        let file_name = log_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("jvmlens.log");
        // Rolling appender adds the date suffix
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let installed = registry
            .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok();
        installed.then_some(guard)
    } else {
        let _ = registry.with(tracing_subscriber::fmt::layer()).try_init();
        None
    }
}
