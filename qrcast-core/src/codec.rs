//! Barcode codec capability
//!
//! Rendering bytes to an image and scanning images back to bytes is an
//! external capability. Implementations are interchangeable and chosen at
//! configuration time through [`CodecKind`](crate::config::CodecKind).

use crate::constants::CODEC_CAP;
use crate::error::TransportError;
use bytes::Bytes;

/// A barcode renderer paired with a scanner
pub trait BarcodeCodec {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// File extension of rendered images
    fn image_extension(&self) -> &'static str;

    /// Chunk payload bytes one barcode carries reliably
    fn capacity(&self) -> usize {
        CODEC_CAP
    }

    /// Render `data` into an encoded image file
    fn render(&self, data: &[u8]) -> Result<Bytes, TransportError>;

    /// Scan an encoded image file, returning every symbol found
    fn scan(&self, image: &[u8]) -> Result<Vec<Bytes>, TransportError>;
}

impl<C: BarcodeCodec + ?Sized> BarcodeCodec for Box<C> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn image_extension(&self) -> &'static str {
        (**self).image_extension()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn render(&self, data: &[u8]) -> Result<Bytes, TransportError> {
        (**self).render(data)
    }

    fn scan(&self, image: &[u8]) -> Result<Vec<Bytes>, TransportError> {
        (**self).scan(image)
    }
}
