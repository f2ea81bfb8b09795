//! Self-checked barcode rendering
//!
//! Every rendered image is scanned again with the codec's own scanner before
//! it is emitted. When the scanner cannot recover the frame, the chunk's
//! content is replaced by synthetic bytes of the same length (printable
//! random bytes first, then the constant filler byte) and rendered again.
//! The sequence metadata is preserved, so receivers see a valid chunk with
//! degraded content rather than a hole. Attempts are capped.

use crate::codec::BarcodeCodec;
use crate::constants::FILLER_BYTE;
use crate::error::TransportError;
use crate::packer::PackedFrame;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A frame together with the image that carries it
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Frame actually rendered (content may be synthetic)
    pub frame: PackedFrame,

    /// Encoded image file
    pub image: Bytes,

    /// Render attempts used
    pub attempts: u32,

    /// Whether the original content was replaced
    pub substituted: bool,
}

/// Renderer that only emits images its own scanner can read
pub struct SelfCheckedRenderer<'a, C: BarcodeCodec + ?Sized> {
    codec: &'a C,
    max_attempts: u32,
    rng: StdRng,
    substituted: usize,
}

impl<'a, C: BarcodeCodec + ?Sized> SelfCheckedRenderer<'a, C> {
    /// Create a renderer allowing `max_attempts` renders per chunk
    pub fn new(codec: &'a C, max_attempts: u32) -> Self {
        Self::with_rng(codec, max_attempts, StdRng::from_entropy())
    }

    /// Create a renderer with a deterministic generator
    pub fn with_seed(codec: &'a C, max_attempts: u32, seed: u64) -> Self {
        Self::with_rng(codec, max_attempts, StdRng::seed_from_u64(seed))
    }

    fn with_rng(codec: &'a C, max_attempts: u32, rng: StdRng) -> Self {
        Self {
            codec,
            max_attempts: max_attempts.max(1),
            rng,
            substituted: 0,
        }
    }

    /// Chunks whose content had to be replaced so far
    pub fn substituted(&self) -> usize {
        self.substituted
    }

    /// Render `frame`, regenerating its content until the image self-decodes
    pub fn render(&mut self, frame: PackedFrame) -> Result<RenderedFrame, TransportError> {
        let mut current = frame;

        for attempt in 1..=self.max_attempts {
            let image = self.codec.render(&current.wire)?;
            let scanned = self.codec.scan(&image)?;

            if scanned
                .iter()
                .any(|symbol| symbol.trim_ascii() == current.wire.as_ref())
            {
                let substituted = attempt > 1;
                if substituted {
                    self.substituted += 1;
                }
                #[cfg(feature = "logging")]
                debug!(
                    "Rendered chunk {} of source {} in {} attempt(s)",
                    current.chunk.index, current.source_id, attempt
                );
                return Ok(RenderedFrame {
                    frame: current,
                    image,
                    attempts: attempt,
                    substituted,
                });
            }

            #[cfg(feature = "logging")]
            warn!(
                "Chunk {} of source {} is not self-decodable (attempt {}/{}), substituting content",
                current.chunk.index, current.source_id, attempt, self.max_attempts
            );

            let replacement = self.replacement(current.chunk.payload.len(), attempt);
            current = current.repack(replacement)?;
        }

        Err(TransportError::Render {
            source_id: current.source_id,
            index: current.chunk.index,
            attempts: self.max_attempts,
        })
    }

    fn replacement(&mut self, len: usize, attempt: u32) -> Bytes {
        if attempt <= self.max_attempts / 2 {
            (0..len).map(|_| self.rng.gen_range(b' '..=b'~')).collect()
        } else {
            Bytes::from(vec![FILLER_BYTE; len])
        }
    }
}
