//! Bundled fallback images
//!
//! Entities without a URL resolve a named asset instead. Lookups are
//! synchronous and never touch the disk cache or the network.

use crate::codec::{ImageCodec, PngCodec, SharedImage};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Resolves asset names to images
pub trait AssetCatalog: Send + Sync {
    /// Image registered under `name`, if any
    fn image_named(&self, name: &str) -> Option<SharedImage>;

    /// Whether `name` resolves
    fn contains(&self, name: &str) -> bool {
        self.image_named(name).is_some()
    }
}

/// Assets held in memory, typically built from `include_bytes!` data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssets {
    images: HashMap<String, SharedImage>,
}

impl InMemoryAssets {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded image
    pub fn insert(&mut self, name: impl Into<String>, image: SharedImage) {
        self.images.insert(name.into(), image);
    }

    /// Decode `bytes` with `codec` and register the result.
    ///
    /// Returns `false` and registers nothing if the bytes do not decode.
    pub fn insert_encoded(
        &mut self,
        name: impl Into<String>,
        bytes: &[u8],
        codec: &dyn ImageCodec,
    ) -> bool {
        match codec.decode(bytes) {
            Some(image) => {
                self.insert(name, Arc::new(image));
                true
            }
            None => false,
        }
    }
}

impl AssetCatalog for InMemoryAssets {
    fn image_named(&self, name: &str) -> Option<SharedImage> {
        self.images.get(name).cloned()
    }

    fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }
}

/// Assets read from a directory shipped next to the application.
///
/// `name` is tried as-is, then with a `.png` extension.
#[derive(Clone)]
pub struct AssetDirectory {
    dir: PathBuf,
    codec: Arc<dyn ImageCodec>,
}

impl AssetDirectory {
    /// Catalog over `dir`, decoding with [`PngCodec`]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_codec(dir, Arc::new(PngCodec))
    }

    /// Catalog over `dir` with a custom codec
    pub fn with_codec(dir: impl Into<PathBuf>, codec: Arc<dyn ImageCodec>) -> Self {
        Self {
            dir: dir.into(),
            codec,
        }
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Vec::new();
        }
        vec![
            self.dir.join(name),
            self.dir.join(format!("{}.png", name)),
        ]
    }
}

impl AssetCatalog for AssetDirectory {
    fn image_named(&self, name: &str) -> Option<SharedImage> {
        for path in self.candidates(name) {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            match self.codec.decode(&bytes) {
                Some(image) => return Some(Arc::new(image)),
                None => debug!("Asset {} did not decode", path.display()),
            }
        }
        None
    }
}

impl fmt::Debug for AssetDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetDirectory")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}
