//! Image encoding and decoding

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;
use tracing::trace;

/// Decoded image shared between the in-memory slot and callers
pub type SharedImage = Arc<DynamicImage>;

/// Converts between raw bytes and decoded images.
///
/// Both directions are infallible in signature: bytes that do not decode and
/// images that do not encode are simply `None`.
pub trait ImageCodec: Send + Sync {
    /// Decode raw bytes into an image
    fn decode(&self, bytes: &[u8]) -> Option<DynamicImage>;

    /// Encode an image into its stored byte form
    fn encode(&self, image: &DynamicImage) -> Option<Vec<u8>>;
}

/// Stores images as PNG and reads any format the `image` crate was built with.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn decode(&self, bytes: &[u8]) -> Option<DynamicImage> {
        match image::load_from_memory(bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                trace!("Decode of {} bytes failed: {}", bytes.len(), e);
                None
            }
        }
    }

    fn encode(&self, image: &DynamicImage) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .ok()?;
        if buf.is_empty() {
            return None;
        }
        Some(buf)
    }
}
