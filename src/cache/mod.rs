//! Persistent image cache
//!
//! A flat directory of files under the platform cache directory, one file
//! per key:
//!
//! ```text
//! <cache dir>/pixcache/
//!     cat.png
//!     photo.jpg
//! ```
//!
//! There is no manifest and no eviction. The operating system reclaims the
//! cache directory when it needs space; the next write recreates it.
//!
//! # Layers
//!
//! | Type | Role |
//! |------|------|
//! | [`CacheRoot`] | Resolves and creates the directory |
//! | [`ByteStore`] | Reads and writes raw bytes per key |
//! | [`DiskCache`] | Encodes/decodes images on top of a store |
//! | [`KeyStrategy`] | Turns an image URL into a key |

pub mod disk;
pub mod key;
pub mod root;
pub mod store;

pub use disk::DiskCache;
pub use key::{last_path_segment, KeyStrategy};
pub use root::CacheRoot;
pub use store::{ByteStorage, ByteStore};
