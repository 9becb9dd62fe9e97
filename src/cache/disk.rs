//! Image-typed disk cache

use crate::cache::root::CacheRoot;
use crate::cache::store::{ByteStorage, ByteStore};
use crate::codec::{ImageCodec, PngCodec};
use crate::error::{PixcacheError, PixcacheResult};
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Maps cache keys to decoded images on top of a [`ByteStorage`].
///
/// Cheap to clone; clones share the same storage and codec.
#[derive(Clone)]
pub struct DiskCache {
    storage: Arc<dyn ByteStorage>,
    codec: Arc<dyn ImageCodec>,
}

impl DiskCache {
    /// Create a disk cache over any storage and codec
    pub fn new(storage: Arc<dyn ByteStorage>, codec: Arc<dyn ImageCodec>) -> Self {
        Self { storage, codec }
    }

    /// PNG cache in a filesystem store at `root`
    pub fn with_root(root: CacheRoot) -> Self {
        Self::new(Arc::new(ByteStore::new(root)), Arc::new(PngCodec))
    }

    /// The codec used for both directions
    pub fn codec(&self) -> &dyn ImageCodec {
        self.codec.as_ref()
    }

    /// Encode `image` and store it under `key`, replacing any previous entry
    pub fn save_image(&self, image: &DynamicImage, key: &str) -> PixcacheResult<()> {
        let bytes = self
            .codec
            .encode(image)
            .ok_or_else(|| PixcacheError::EncodingFailed {
                key: key.to_string(),
            })?;
        self.storage.write(key, &bytes)
    }

    /// Image stored under `key`.
    ///
    /// Entries that fail to decode read as absent and are left in place.
    pub fn read_image_for_key(&self, key: &str) -> Option<DynamicImage> {
        let bytes = self.storage.read(key)?;
        let image = self.codec.decode(&bytes);
        if image.is_none() {
            debug!("Cache entry '{}' ({} bytes) did not decode", key, bytes.len());
        }
        image
    }

    /// Alias of [`DiskCache::save_image`]
    pub fn save(&self, image: &DynamicImage, key: &str) -> PixcacheResult<()> {
        self.save_image(image, key)
    }

    /// Alias of [`DiskCache::read_image_for_key`]
    pub fn load(&self, key: &str) -> Option<DynamicImage> {
        self.read_image_for_key(key)
    }
}

impl Default for DiskCache {
    fn default() -> Self {
        Self::with_root(CacheRoot::platform())
    }
}

impl fmt::Debug for DiskCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskCache").finish_non_exhaustive()
    }
}
