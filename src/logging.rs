//! Tracing subscriber setup

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Filter from `RUST_LOG` if set, otherwise `marquee=<level>,warn`
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("marquee={level},warn")))
}

/// Install the global subscriber (`json` or human-readable text)
///
/// # Errors
///
/// Fails if a global subscriber is already installed
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(&config.level);

    match config.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
