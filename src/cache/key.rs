//! Cache key derivation from image URLs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// How a locator is turned into a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    /// Final non-empty path segment: `https://host/a/b/photo.jpg` → `photo.jpg`.
    ///
    /// Two URLs ending in the same segment share one cache entry.
    #[default]
    LastPathSegment,

    /// Hex SHA-256 of the whole URL, plus the final segment's extension.
    LocatorDigest,
}

impl KeyStrategy {
    /// Derive the key for `locator`, or `None` if it has no path segment
    pub fn derive(self, locator: &Url) -> Option<String> {
        match self {
            Self::LastPathSegment => last_path_segment(locator).map(str::to_string),
            Self::LocatorDigest => {
                let segment = last_path_segment(locator)?;
                let digest = hex::encode(Sha256::digest(locator.as_str().as_bytes()));
                match extension(segment) {
                    Some(ext) => Some(format!("{}.{}", digest, ext)),
                    None => Some(digest),
                }
            }
        }
    }
}

/// Final non-empty path segment, still percent-encoded
pub fn last_path_segment(locator: &Url) -> Option<&str> {
    locator
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
}

fn extension(segment: &str) -> Option<&str> {
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}
