//! Collaborators the read-through chain runs against

use crate::assets::{AssetCatalog, AssetDirectory, InMemoryAssets};
use crate::cache::{CacheRoot, DiskCache, KeyStrategy};
use crate::codec::SharedImage;
use crate::config::{Config, ConfigManager};
use crate::error::PixcacheResult;
use crate::fetch::{Fetcher, HttpFetcher};
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Disk cache, network fetcher and asset catalog bundled together.
///
/// One instance is normally shared by every entity in a process. Cloning is
/// cheap and clones share all collaborators.
#[derive(Clone)]
pub struct ImageCache {
    disk: DiskCache,
    fetcher: Arc<dyn Fetcher>,
    assets: Arc<dyn AssetCatalog>,
    key_strategy: KeyStrategy,
}

impl ImageCache {
    /// Create a context with no bundled assets and last-segment keys
    pub fn new(disk: DiskCache, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            disk,
            fetcher,
            assets: Arc::new(InMemoryAssets::new()),
            key_strategy: KeyStrategy::default(),
        }
    }

    /// Build the full collaborator set from configuration
    pub fn from_config(config: &Config) -> Self {
        let disk = DiskCache::with_root(CacheRoot::from_config(&config.cache));
        let fetcher = Arc::new(HttpFetcher::new(&config.network));
        let cache = Self::new(disk, fetcher).with_key_strategy(config.cache.key_strategy);

        match &config.assets.dir {
            Some(dir) => cache.with_assets(Arc::new(AssetDirectory::new(dir.clone()))),
            None => cache,
        }
    }

    /// Load the config file at its default location and build from it.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub async fn load_default() -> PixcacheResult<Self> {
        Self::load_with(&ConfigManager::new()).await
    }

    /// Load configuration through `manager` and build from it
    pub async fn load_with(manager: &ConfigManager) -> PixcacheResult<Self> {
        let config = manager.load().await?;
        Ok(Self::from_config(&config))
    }

    /// Replace the asset catalog used for fallback names
    pub fn with_assets(mut self, assets: Arc<dyn AssetCatalog>) -> Self {
        self.assets = assets;
        self
    }

    /// Replace the key derivation strategy
    pub fn with_key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    /// The disk layer
    pub fn disk(&self) -> &DiskCache {
        &self.disk
    }

    /// The network layer
    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    /// The fallback asset catalog
    pub fn assets(&self) -> &dyn AssetCatalog {
        self.assets.as_ref()
    }

    /// Active key derivation strategy
    pub fn key_strategy(&self) -> KeyStrategy {
        self.key_strategy
    }

    /// Cache key for `locator` under the active strategy
    pub fn key_for(&self, locator: &Url) -> Option<String> {
        self.key_strategy.derive(locator)
    }

    /// Store `image` on disk under `key`
    pub fn save_image(&self, image: &DynamicImage, key: &str) -> PixcacheResult<()> {
        self.disk.save_image(image, key)
    }

    /// Image stored on disk under `key`
    pub fn read_image_for_key(&self, key: &str) -> Option<DynamicImage> {
        self.disk.read_image_for_key(key)
    }

    /// Write `image` to disk without making the caller wait.
    ///
    /// Failures are logged and dropped. Outside a tokio runtime the write
    /// happens inline.
    pub(crate) fn persist_detached(&self, image: SharedImage, key: String) {
        let disk = self.disk.clone();
        let persist = move || match disk.save_image(&image, &key) {
            Ok(()) => debug!("Persisted '{}' to disk cache", key),
            Err(e) => warn!("Failed to persist '{}' to disk cache: {}", key, e),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(persist);
            }
            Err(_) => persist(),
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DiskCache::default(), Arc::new(HttpFetcher::default()))
    }
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("disk", &self.disk)
            .field("key_strategy", &self.key_strategy)
            .finish_non_exhaustive()
    }
}
