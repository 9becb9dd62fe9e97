//! Read-through image retrieval for caller-owned objects

use crate::codec::SharedImage;
use crate::preview::context::ImageCache;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};
use url::Url;

/// Anything that owns an image URL and wants it cached in memory and on disk.
///
/// Implementors provide the URL, an optional fallback asset name and one
/// in-memory slot; the lookup chain comes for free:
///
/// 1. no URL → fallback asset (stored in the slot even when missing)
/// 2. slot filled → slot
/// 3. disk cache hit → disk image, copied into the slot
/// 4. otherwise → [`download_image`](ImageFetchable::download_image)
///
/// Every step answers with `Option`; no error ever leaves the chain.
///
/// # Delivery context
///
/// Steps 1–3 complete on the first poll, on the caller's own task, and block
/// it for the length of any disk read. Only the download suspends: the
/// transport runs on the blocking pool and the result is handed back to the
/// awaiting task. On a `current_thread` runtime driven from the main thread,
/// every result therefore lands on the main thread.
///
/// # Concurrency
///
/// Nothing is coalesced. Two entities sharing a URL that both miss will both
/// download and both write the same disk entry; the last write wins.
#[async_trait]
pub trait ImageFetchable: Send {
    /// Where the image is downloaded from
    fn url(&self) -> Option<&Url>;

    /// Bundled asset used when [`url`](ImageFetchable::url) is `None`
    fn fallback_image_name(&self) -> Option<&str> {
        None
    }

    /// Current content of the in-memory slot
    fn in_memory_preview(&self) -> Option<&SharedImage>;

    /// Replace the content of the in-memory slot
    fn set_in_memory_preview(&mut self, preview: Option<SharedImage>);

    /// True when the image is in memory, on disk, or (without a URL) a known
    /// asset.
    ///
    /// Reads and decodes the disk entry to answer, so it is not free.
    fn is_cached(&self, cache: &ImageCache) -> bool {
        if self.in_memory_preview().is_some() {
            return true;
        }

        match self.url() {
            Some(url) => cache
                .key_for(url)
                .is_some_and(|key| cache.disk().load(&key).is_some()),
            None => self
                .fallback_image_name()
                .is_some_and(|name| cache.assets().contains(name)),
        }
    }

    /// Get the image through memory, disk, then network.
    async fn fetch_preview(&mut self, cache: &ImageCache) -> Option<SharedImage> {
        let Some(url) = self.url().cloned() else {
            let fallback = self
                .fallback_image_name()
                .and_then(|name| cache.assets().image_named(name));
            self.set_in_memory_preview(fallback.clone());
            return fallback;
        };

        if let Some(preview) = self.in_memory_preview() {
            trace!("Memory hit for {}", url);
            return Some(preview.clone());
        }

        if let Some(key) = cache.key_for(&url) {
            if let Some(image) = cache.disk().load(&key) {
                trace!("Disk hit for {} under '{}'", url, key);
                let image = Arc::new(image);
                self.set_in_memory_preview(Some(image.clone()));
                return Some(image);
            }
        }

        self.download_image(cache).await
    }

    /// Download the image, fill the slot and persist it to disk.
    ///
    /// One attempt, no retry. The disk write starts after the slot is filled
    /// and is not awaited; its failure never reaches the caller.
    async fn download_image(&mut self, cache: &ImageCache) -> Option<SharedImage> {
        let url = self.url().cloned()?;

        let bytes = match cache.fetcher().fetch(&url).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                debug!("Download of {} returned no bytes", url);
                return None;
            }
            Err(e) => {
                debug!("Download of {} failed: {}", url, e);
                return None;
            }
        };

        let Some(image) = cache.disk().codec().decode(&bytes) else {
            debug!("Download of {} is not a decodable image", url);
            return None;
        };

        let image = Arc::new(image);
        self.set_in_memory_preview(Some(image.clone()));

        match cache.key_for(&url) {
            Some(key) => cache.persist_detached(image.clone(), key),
            None => debug!("No cache key for {}, keeping it in memory only", url),
        }

        Some(image)
    }
}
