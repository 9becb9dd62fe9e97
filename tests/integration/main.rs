//! Integration tests for pixcache

use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use pixcache::{
    ByteStorage, ByteStore, CacheRoot, DiskCache, Fetcher, ImageCache, ImageCodec,
    ImageFetchable, InMemoryAssets, KeyStrategy, PixcacheError, PixcacheResult, PngCodec,
    RemoteImage,
};
use std::future::Future;
use std::pin::pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// Filesystem store that counts calls and can refuse writes
struct CountingStore {
    inner: ByteStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_writes: bool,
}

impl CountingStore {
    fn new(root: CacheRoot, fail_writes: bool) -> Self {
        Self {
            inner: ByteStore::new(root),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_writes,
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ByteStorage for CountingStore {
    fn write(&self, key: &str, bytes: &[u8]) -> PixcacheResult<()> {
        let result = if self.fail_writes {
            Err(PixcacheError::WriteFailed {
                path: key.into(),
                source: std::io::Error::other("disk full"),
            })
        } else {
            self.inner.write(key, bytes)
        };
        // counted once the file is in place (or the write has failed)
        self.writes.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn read(&self, key: &str) -> Option<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key)
    }
}

/// Fetcher answering every request with the same canned response
struct StubFetcher {
    response: Option<Vec<u8>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(response: Option<Vec<u8>>) -> Self {
        Self {
            response,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, locator: &Url) -> PixcacheResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response
            .clone()
            .ok_or_else(|| PixcacheError::fetch(locator.as_str(), "connection reset"))
    }
}

struct Harness {
    cache: ImageCache,
    store: Arc<CountingStore>,
    fetcher: Arc<StubFetcher>,
    _temp: TempDir,
}

fn harness_with(fetcher: StubFetcher, fail_writes: bool) -> Harness {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(CountingStore::new(
        CacheRoot::at(temp.path(), "pixcache"),
        fail_writes,
    ));
    let fetcher = Arc::new(fetcher);
    let cache = ImageCache::new(DiskCache::new(store.clone(), Arc::new(PngCodec)), fetcher.clone());
    Harness {
        cache,
        store,
        fetcher,
        _temp: temp,
    }
}

fn harness(response: Option<Vec<u8>>) -> Harness {
    harness_with(StubFetcher::new(response), false)
}

fn sample(shade: u8) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(4, 3, |x, y| {
        Rgba([shade, x as u8 * 50, y as u8 * 70, 255])
    }))
}

fn png(image: &DynamicImage) -> Vec<u8> {
    PngCodec.encode(image).unwrap()
}

fn same_pixels(a: &DynamicImage, b: &DynamicImage) -> bool {
    a.to_rgba8() == b.to_rgba8()
}

/// Poll `future` exactly once with a waker that does nothing
fn poll_once<F: Future>(future: F) -> Poll<F::Output> {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(futures_util::task::noop_waker_ref());
    future.as_mut().poll(&mut cx)
}

/// Persistence is detached from delivery, so poll until it lands
async fn wait_for_writes(store: &CountingStore, expected: usize) {
    for _ in 0..200 {
        if store.writes() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {} writes, saw {}", expected, store.writes());
}

mod read_through {
    use super::*;

    #[tokio::test]
    async fn download_fills_memory_and_disk() {
        let h = harness(Some(png(&sample(10))));
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        let image = entity.fetch_preview(&h.cache).await.unwrap();
        assert!(same_pixels(&image, &sample(10)));
        assert_eq!(h.fetcher.calls(), 1);
        assert!(entity.in_memory_preview().is_some());

        wait_for_writes(&h.store, 1).await;
        let on_disk = h.cache.read_image_for_key("cat.png").unwrap();
        assert!(same_pixels(&on_disk, &sample(10)));
    }

    #[tokio::test]
    async fn disk_hit_skips_network() {
        let h = harness(Some(png(&sample(99))));
        h.cache.save_image(&sample(20), "cat.png").unwrap();
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        let image = entity.fetch_preview(&h.cache).await.unwrap();
        assert!(same_pixels(&image, &sample(20)));
        assert_eq!(h.fetcher.calls(), 0);
        assert!(entity.in_memory_preview().is_some());
    }

    #[tokio::test]
    async fn memory_hit_touches_neither_disk_nor_network() {
        let h = harness(Some(png(&sample(99))));
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();
        entity.set_in_memory_preview(Some(Arc::new(sample(30))));

        for _ in 0..3 {
            let image = entity.fetch_preview(&h.cache).await.unwrap();
            assert!(same_pixels(&image, &sample(30)));
        }
        assert_eq!(h.store.reads(), 0);
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_memory() {
        let h = harness(Some(png(&sample(40))));
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        entity.fetch_preview(&h.cache).await.unwrap();
        let reads_after_first = h.store.reads();
        entity.fetch_preview(&h.cache).await.unwrap();

        assert_eq!(h.store.reads(), reads_after_first);
        assert_eq!(h.fetcher.calls(), 1);
        wait_for_writes(&h.store, 1).await;
    }

    #[tokio::test]
    async fn stale_disk_entry_wins_over_network() {
        let h = harness(Some(png(&sample(200))));
        h.cache.save_image(&sample(1), "cat.png").unwrap();
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        let image = entity.fetch_preview(&h.cache).await.unwrap();
        assert!(same_pixels(&image, &sample(1)));
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn corrupt_disk_entry_falls_through_to_network() {
        let h = harness(Some(png(&sample(50))));
        h.store.inner.write("cat.png", b"garbage").unwrap();
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        let image = entity.fetch_preview(&h.cache).await.unwrap();
        assert!(same_pixels(&image, &sample(50)));
        assert_eq!(h.fetcher.calls(), 1);

        wait_for_writes(&h.store, 1).await;
        assert!(h.cache.read_image_for_key("cat.png").is_some());
    }

    #[tokio::test]
    async fn url_without_path_segment_stays_in_memory() {
        let h = harness(Some(png(&sample(60))));
        let mut entity = RemoteImage::parse("https://x/").unwrap();

        assert!(entity.fetch_preview(&h.cache).await.is_some());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.store.reads(), 0);
        assert_eq!(h.store.writes(), 0);
    }
}

mod fallback {
    use super::*;

    fn assets_with_placeholder() -> Arc<InMemoryAssets> {
        let mut assets = InMemoryAssets::new();
        assets.insert("placeholder", Arc::new(sample(5)));
        Arc::new(assets)
    }

    #[tokio::test]
    async fn known_asset_resolves_without_disk_or_network() {
        let h = harness(Some(png(&sample(99))));
        let cache = h.cache.clone().with_assets(assets_with_placeholder());
        let mut entity = RemoteImage::placeholder("placeholder");

        let image = entity.fetch_preview(&cache).await.unwrap();
        assert!(same_pixels(&image, &sample(5)));
        assert!(entity.in_memory_preview().is_some());
        assert!(entity.is_cached(&cache));
        assert_eq!(h.store.reads(), 0);
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn missing_asset_delivers_none() {
        let h = harness(Some(png(&sample(99))));
        let mut entity = RemoteImage::placeholder("placeholder");

        assert!(entity.fetch_preview(&h.cache).await.is_none());
        assert!(!entity.is_cached(&h.cache));
        assert_eq!(h.store.reads(), 0);
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn missing_asset_clears_slot() {
        let h = harness(None);
        let mut entity = RemoteImage::placeholder("placeholder");
        entity.set_in_memory_preview(Some(Arc::new(sample(7))));

        assert!(entity.fetch_preview(&h.cache).await.is_none());
        assert!(entity.in_memory_preview().is_none());
    }

    #[tokio::test]
    async fn url_takes_precedence_over_fallback() {
        let h = harness(Some(png(&sample(70))));
        let cache = h.cache.clone().with_assets(assets_with_placeholder());
        let mut entity = RemoteImage::parse("https://x/y/cat.png")
            .unwrap()
            .with_fallback("placeholder");

        let image = entity.fetch_preview(&cache).await.unwrap();
        assert!(same_pixels(&image, &sample(70)));
        assert_eq!(h.fetcher.calls(), 1);
        wait_for_writes(&h.store, 1).await;
    }
}

mod download_failures {
    use super::*;

    #[tokio::test]
    async fn non_image_bytes_deliver_none_and_write_nothing() {
        let h = harness(Some(b"<html>404</html>".to_vec()));
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        assert!(entity.download_image(&h.cache).await.is_none());
        assert!(entity.in_memory_preview().is_none());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn transport_failure_delivers_none_without_retry() {
        let h = harness(None);
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        assert!(entity.fetch_preview(&h.cache).await.is_none());
        assert_eq!(h.fetcher.calls(), 1);

        // the caller retries by asking again
        assert!(entity.fetch_preview(&h.cache).await.is_none());
        assert_eq!(h.fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn empty_body_delivers_none() {
        let h = harness(Some(Vec::new()));
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();
        assert!(entity.download_image(&h.cache).await.is_none());
    }

    #[tokio::test]
    async fn download_without_url_delivers_none() {
        let h = harness(Some(png(&sample(1))));
        let mut entity = RemoteImage::placeholder("anything");

        assert!(entity.download_image(&h.cache).await.is_none());
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn failed_persistence_still_delivers_image() {
        let h = harness_with(StubFetcher::new(Some(png(&sample(80)))), true);
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        let image = entity.download_image(&h.cache).await.unwrap();
        assert!(same_pixels(&image, &sample(80)));
        assert!(entity.in_memory_preview().is_some());

        wait_for_writes(&h.store, 1).await;
        assert!(h.cache.read_image_for_key("cat.png").is_none());
    }
}

mod is_cached {
    use super::*;

    #[tokio::test]
    async fn reflects_memory_then_disk() {
        let h = harness(Some(png(&sample(90))));
        let mut first = RemoteImage::parse("https://x/y/cat.png").unwrap();
        assert!(!first.is_cached(&h.cache));

        first.fetch_preview(&h.cache).await.unwrap();
        let reads = h.store.reads();
        assert!(first.is_cached(&h.cache));
        assert_eq!(h.store.reads(), reads);

        wait_for_writes(&h.store, 1).await;
        let second = RemoteImage::parse("https://x/y/cat.png").unwrap();
        assert!(second.is_cached(&h.cache));
        assert!(second.in_memory_preview().is_none());
    }
}

mod keys {
    use super::*;

    #[tokio::test]
    async fn shared_last_segment_shares_disk_entry() {
        let h = harness(Some(png(&sample(11))));
        let mut first = RemoteImage::parse("https://one.example/a/cat.png").unwrap();
        first.fetch_preview(&h.cache).await.unwrap();
        wait_for_writes(&h.store, 1).await;

        let mut second = RemoteImage::parse("https://two.example/b/cat.png").unwrap();
        let image = second.fetch_preview(&h.cache).await.unwrap();

        // served from the entry the first URL wrote
        assert!(same_pixels(&image, &sample(11)));
        assert_eq!(h.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn digest_strategy_keeps_urls_apart() {
        let h = harness(Some(png(&sample(12))));
        let cache = h.cache.clone().with_key_strategy(KeyStrategy::LocatorDigest);

        let mut first = RemoteImage::parse("https://one.example/a/cat.png").unwrap();
        first.fetch_preview(&cache).await.unwrap();
        wait_for_writes(&h.store, 1).await;

        let mut second = RemoteImage::parse("https://two.example/b/cat.png").unwrap();
        second.fetch_preview(&cache).await.unwrap();
        assert_eq!(h.fetcher.calls(), 2);
        wait_for_writes(&h.store, 2).await;
        assert!(cache.read_image_for_key("cat.png").is_none());
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_misses_both_download() {
        let mut fetcher = StubFetcher::new(Some(png(&sample(13))));
        fetcher.delay = Some(Duration::from_millis(30));
        let h = harness_with(fetcher, false);

        let mut a = RemoteImage::parse("https://x/y/cat.png").unwrap();
        let mut b = RemoteImage::parse("https://x/y/cat.png").unwrap();
        let (ra, rb) = tokio::join!(a.fetch_preview(&h.cache), b.fetch_preview(&h.cache));

        assert!(ra.is_some() && rb.is_some());
        assert_eq!(h.fetcher.calls(), 2);
        wait_for_writes(&h.store, 2).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn racing_writers_leave_one_complete_entry() {
        let temp = TempDir::new().unwrap();
        let disk = DiskCache::with_root(CacheRoot::at(temp.path(), "pixcache"));

        let mut handles = Vec::new();
        for shade in [100u8, 150, 200, 250] {
            let disk = disk.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                disk.save_image(&sample(shade), "cat.png")
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // unsynchronized: whatever decodes must be one of the written images
        if let Some(stored) = disk.load("cat.png") {
            assert!([100u8, 150, 200, 250]
                .iter()
                .any(|&shade| same_pixels(&stored, &sample(shade))));
        }

        // a later uncontended save always leaves a clean entry
        disk.save_image(&sample(42), "cat.png").unwrap();
        assert!(same_pixels(&disk.load("cat.png").unwrap(), &sample(42)));
    }
}

mod first_poll {
    use super::*;

    // no runtime here: these paths must not need one

    #[test]
    fn disk_hit_is_ready() {
        let h = harness(Some(png(&sample(99))));
        h.cache.save_image(&sample(21), "cat.png").unwrap();
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        match poll_once(entity.fetch_preview(&h.cache)) {
            Poll::Ready(Some(image)) => assert!(same_pixels(&image, &sample(21))),
            Poll::Ready(None) => panic!("disk hit delivered nothing"),
            Poll::Pending => panic!("disk hit suspended"),
        }
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[test]
    fn memory_hit_is_ready() {
        let h = harness(Some(png(&sample(99))));
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();
        entity.set_in_memory_preview(Some(Arc::new(sample(31))));

        match poll_once(entity.fetch_preview(&h.cache)) {
            Poll::Ready(Some(image)) => assert!(same_pixels(&image, &sample(31))),
            Poll::Ready(None) => panic!("memory hit delivered nothing"),
            Poll::Pending => panic!("memory hit suspended"),
        }
        assert_eq!(h.store.reads(), 0);
    }

    #[test]
    fn missing_fallback_is_ready() {
        let h = harness(Some(png(&sample(99))));
        let mut entity = RemoteImage::placeholder("placeholder");

        assert!(matches!(
            poll_once(entity.fetch_preview(&h.cache)),
            Poll::Ready(None)
        ));
        assert_eq!(h.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn download_suspends() {
        let mut fetcher = StubFetcher::new(Some(png(&sample(14))));
        fetcher.delay = Some(Duration::from_millis(200));
        let h = harness_with(fetcher, false);
        let mut entity = RemoteImage::parse("https://x/y/cat.png").unwrap();

        assert!(poll_once(entity.fetch_preview(&h.cache)).is_pending());
        assert_eq!(h.fetcher.calls(), 1);
        assert_eq!(h.store.writes(), 0);
    }
}
