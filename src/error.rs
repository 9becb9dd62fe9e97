//! Error types for pixcache
//!
//! All fallible operations return `PixcacheResult<T>`. The read-through
//! chain on [`ImageFetchable`](crate::ImageFetchable) never returns these:
//! it degrades every failure to "no image".

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pixcache operations
pub type PixcacheResult<T> = Result<T, PixcacheError>;

/// All errors that can occur in pixcache
#[derive(Error, Debug)]
pub enum PixcacheError {
    // Storage errors
    #[error("Cache directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },

    #[error("Image for key '{key}' can't be represented as PNG")]
    EncodingFailed { key: String },

    #[error("Failed to write cache entry {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Transport errors
    #[error("Fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Fetching {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Fetching {url} returned an empty body")]
    EmptyBody { url: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PixcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a directory-unavailable error
    pub fn directory_unavailable(reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if repeating the same call could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { .. } | Self::WriteFailed { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DirectoryUnavailable { .. } => {
                Some("Set [cache] base_dir to a writable directory")
            }
            Self::WriteFailed { .. } => Some("Check free disk space and cache directory permissions"),
            Self::ConfigInvalid { .. } => Some("Fix the TOML syntax or remove the file to use defaults"),
            _ => None,
        }
    }
}
