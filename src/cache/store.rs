//! Flat key→bytes storage on disk

use crate::cache::root::CacheRoot;
use crate::error::{PixcacheError, PixcacheResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Persistent key→bytes storage.
///
/// Reads never fail: an unreachable store and an absent key both come back
/// as `None`, so callers can treat every miss the same way.
pub trait ByteStorage: Send + Sync {
    /// Store `bytes` under `key`, replacing whatever was there
    fn write(&self, key: &str, bytes: &[u8]) -> PixcacheResult<()>;

    /// Bytes stored under `key`, or `None` on a miss
    fn read(&self, key: &str) -> Option<Vec<u8>>;

    /// Whether an entry exists under `key`.
    ///
    /// Existence only: an entry that exists but cannot be read (or does not
    /// decode) still counts, so this may be `true` where [`read`] is `None`.
    ///
    /// [`read`]: ByteStorage::read
    fn contains(&self, key: &str) -> bool {
        self.read(key).is_some()
    }
}

/// Filesystem-backed [`ByteStorage`].
///
/// Each key is one file directly under the cache root; the directory listing
/// is the only index. Writers are not synchronized: two writes to the same key
/// race and the last one wins.
#[derive(Debug, Clone)]
pub struct ByteStore {
    root: CacheRoot,
}

impl ByteStore {
    /// Create a store over the given root
    pub fn new(root: CacheRoot) -> Self {
        Self { root }
    }

    /// The root this store writes into
    pub fn root(&self) -> &CacheRoot {
        &self.root
    }

    /// Resolve (and create) the root directory
    pub fn ensure_root(&self) -> PixcacheResult<PathBuf> {
        self.root.ensure()
    }

    /// Where `key` lives on disk, without touching the filesystem
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.root.path().map(|root| root.join(key))
    }
}

impl Default for ByteStore {
    fn default() -> Self {
        Self::new(CacheRoot::platform())
    }
}

impl ByteStorage for ByteStore {
    fn write(&self, key: &str, bytes: &[u8]) -> PixcacheResult<()> {
        let path = self.ensure_root()?.join(key);

        std::fs::write(&path, bytes).map_err(|source| PixcacheError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        trace!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        let path = match self.ensure_root() {
            Ok(root) => root.join(key),
            Err(e) => {
                debug!("Cache read for '{}' skipped: {}", key, e);
                return None;
            }
        };

        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    // stat only, no read: unreadable files count as present
    fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_some_and(|path| path.is_file())
    }
}
