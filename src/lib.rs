//! pixcache - two-tier image cache
//!
//! Keeps remote images in memory per owning object and on disk per key,
//! downloading only when both miss.
//!
//! ```ignore
//! use pixcache::{ImageCache, ImageFetchable, RemoteImage};
//!
//! let cache = ImageCache::default();
//! let mut avatar = RemoteImage::parse("https://example.com/users/42/avatar.png")?;
//!
//! if let Some(image) = avatar.fetch_preview(&cache).await {
//!     println!("{}x{}", image.width(), image.height());
//! }
//! ```

pub mod assets;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod preview;

pub use assets::{AssetCatalog, AssetDirectory, InMemoryAssets};
pub use cache::{ByteStorage, ByteStore, CacheRoot, DiskCache, KeyStrategy};
pub use codec::{ImageCodec, PngCodec, SharedImage};
pub use config::{Config, ConfigManager};
pub use error::{PixcacheError, PixcacheResult};
pub use fetch::{Fetcher, HttpFetcher};
pub use preview::{ImageCache, ImageFetchable, RemoteImage};
