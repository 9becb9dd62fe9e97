//! Network fetch abstraction
//!
//! Provides a trait for downloading raw image bytes so the read-through chain
//! can run against the real HTTP transport or a test double.

mod http;

pub use http::HttpFetcher;

use crate::error::PixcacheResult;
use async_trait::async_trait;
use url::Url;

/// Downloads the bytes behind a locator.
///
/// Implementations do their work off the caller's task where it blocks, and
/// must not retry: one failed attempt is the final answer for that call.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `locator` and return the response body
    async fn fetch(&self, locator: &Url) -> PixcacheResult<Vec<u8>>;
}
