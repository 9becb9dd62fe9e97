//! Optional `tracing` subscriber setup
//!
//! The library only emits `tracing` events. Applications that have no
//! subscriber of their own can call [`init`] once at startup.
//!
//! `RUST_LOG` takes precedence; otherwise the configured level is applied to
//! the `pixcache` target only.

use crate::config::LoggingConfig;
use crate::error::{PixcacheError, PixcacheResult};
use tracing_subscriber::EnvFilter;

/// Build the filter used by [`init`]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pixcache={}", config.level)))
}

/// Install a global fmt subscriber.
///
/// Fails instead of panicking if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> PixcacheResult<()> {
    let filter = env_filter(config);

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
        "text" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .try_init(),
        other => {
            return Err(PixcacheError::Logging(format!(
                "unknown log format '{}', expected text or json",
                other
            )))
        }
    };

    result.map_err(|e| PixcacheError::Logging(e.to_string()))
}
