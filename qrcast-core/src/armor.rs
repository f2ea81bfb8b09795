//! Text-safe armor for serialized frames
//!
//! Barcode scanners hand decoded data back as text in a multi-byte character
//! encoding, so any byte with the high bit set comes back mangled. Frames
//! are therefore base64-armored before rendering and de-armored before
//! parsing. Every armored byte is 7-bit ASCII.

use crate::error::FrameError;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;

/// Armor a serialized frame
pub fn armor(frame: &[u8]) -> Bytes {
    Bytes::from(BASE64_STANDARD.encode(frame).into_bytes())
}

/// Invert [`armor`]. Surrounding ASCII whitespace (scanner line endings) is ignored.
pub fn unarmor(text: &[u8]) -> Result<Bytes, FrameError> {
    BASE64_STANDARD
        .decode(text.trim_ascii())
        .map(Bytes::from)
        .map_err(|e| FrameError::Armor(e.to_string()))
}

/// Length of the armored form of `len` frame bytes
pub const fn armored_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}
