//! Structured logging infrastructure for Tidelink.
//!
//! Centralised subscriber setup with optional JSON output. The `RUST_LOG`
//! environment variable overrides the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize human-readable logging at `level`.
///
/// Calling this more than once is a no-op.
///
/// # Example
/// ```no_run
/// use tidelink_core::logging;
///
/// logging::init("info");
/// tracing::info!("Router started");
/// ```
pub fn init(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}

/// Initialize JSON logging at `level`, for log aggregation on shore.
///
/// Calling this more than once is a no-op.
pub fn init_json(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(level))
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .try_init();
}

/// Initialize logging from the `[logging]` configuration section.
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json(&config.level);
    } else {
        init(&config.level);
    }
}
