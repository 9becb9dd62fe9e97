//! Ready-made fetchable entity

use crate::codec::SharedImage;
use crate::preview::fetchable::ImageFetchable;
use url::Url;

/// Plain holder for a URL, a fallback asset name and the in-memory slot.
///
/// For callers whose own types should not carry cache state.
#[derive(Debug, Clone, Default)]
pub struct RemoteImage {
    url: Option<Url>,
    fallback_name: Option<String>,
    preview: Option<SharedImage>,
}

impl RemoteImage {
    /// Entity downloading from `url`
    pub fn new(url: Url) -> Self {
        Self {
            url: Some(url),
            ..Self::default()
        }
    }

    /// Entity without a URL that resolves to a bundled asset
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            fallback_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parse `url` and build an entity from it
    pub fn parse(url: &str) -> Result<Self, url::ParseError> {
        Url::parse(url).map(Self::new)
    }

    /// Set the fallback asset name
    pub fn with_fallback(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }
}

impl ImageFetchable for RemoteImage {
    fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    fn fallback_image_name(&self) -> Option<&str> {
        self.fallback_name.as_deref()
    }

    fn in_memory_preview(&self) -> Option<&SharedImage> {
        self.preview.as_ref()
    }

    fn set_in_memory_preview(&mut self, preview: Option<SharedImage>) {
        self.preview = preview;
    }
}
