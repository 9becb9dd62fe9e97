//! Cache root directory resolution

use crate::config::schema::DEFAULT_CACHE_DIR_NAME;
use crate::config::CacheConfig;
use crate::error::{PixcacheError, PixcacheResult};
use std::path::PathBuf;

/// Directory every cache entry lives in: `<base>/<dir_name>`.
///
/// The base is normally the platform cache directory (`~/.cache` on Linux,
/// `~/Library/Caches` on macOS). It is resolved when the root is built and
/// the subdirectory is created on demand by [`CacheRoot::ensure`]. Nothing
/// here ever deletes it; reclaiming space is left to the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoot {
    base: Option<PathBuf>,
    dir_name: String,
}

impl CacheRoot {
    /// Root under the platform cache directory with the default name
    pub fn platform() -> Self {
        Self::platform_named(DEFAULT_CACHE_DIR_NAME)
    }

    /// Root under the platform cache directory with a custom name
    pub fn platform_named(dir_name: impl Into<String>) -> Self {
        Self {
            base: dirs::cache_dir(),
            dir_name: dir_name.into(),
        }
    }

    /// Root under an explicit base directory
    pub fn at(base: impl Into<PathBuf>, dir_name: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            dir_name: dir_name.into(),
        }
    }

    /// Build a root from the `[cache]` config section
    pub fn from_config(config: &CacheConfig) -> Self {
        match &config.base_dir {
            Some(base) => Self::at(base.clone(), config.dir_name.clone()),
            None => Self::platform_named(config.dir_name.clone()),
        }
    }

    /// Full path of the root, if a base directory is known
    pub fn path(&self) -> Option<PathBuf> {
        self.base.as_ref().map(|base| base.join(&self.dir_name))
    }

    /// Resolve the root and create it (with parents) if missing.
    ///
    /// Idempotent. Runs on every store access so a directory reclaimed by
    /// the OS mid-process is recreated on the next write.
    pub fn ensure(&self) -> PixcacheResult<PathBuf> {
        let path = self
            .path()
            .ok_or_else(|| PixcacheError::directory_unavailable("no platform cache directory"))?;

        std::fs::create_dir_all(&path).map_err(|e| {
            PixcacheError::directory_unavailable(format!("creating {}: {}", path.display(), e))
        })?;

        Ok(path)
    }
}

impl Default for CacheRoot {
    fn default() -> Self {
        Self::platform()
    }
}
