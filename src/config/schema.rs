//! Configuration schema for pixcache
//!
//! Configuration is stored at `~/.config/pixcache/config.toml`

use crate::cache::KeyStrategy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default name of the subdirectory created under the platform cache dir
pub const DEFAULT_CACHE_DIR_NAME: &str = "pixcache";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Disk cache settings
    pub cache: CacheConfig,

    /// HTTP transport settings
    pub network: NetworkConfig,

    /// Bundled asset settings
    pub assets: AssetsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Disk cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Subdirectory created under the cache base directory
    pub dir_name: String,

    /// Overrides the platform cache directory
    pub base_dir: Option<PathBuf>,

    /// How cache keys are derived from image URLs
    pub key_strategy: KeyStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_CACHE_DIR_NAME.to_string(),
            base_dir: None,
            key_strategy: KeyStrategy::default(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Largest response body accepted, in bytes
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("pixcache/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Bundled asset configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory searched for fallback images
    pub dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level applied to the `pixcache` target when `RUST_LOG` is unset
    pub level: String,

    /// Log format: "text" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}
