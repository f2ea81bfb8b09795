//! Core types for qrcast chunks and frames

use crate::constants::{BEGIN_MARKER, CHUNK_HEADER_SIZE, DEFAULT_DESTINATION};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A unit of source payload with its sequence metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 1-based position within the source
    pub index: u32,

    /// Length of `payload`, carried so receivers can size filler
    pub declared_length: u32,

    /// First chunk of the source
    pub start: bool,

    /// Last chunk of the source
    pub end: bool,

    /// Raw source bytes
    pub payload: Bytes,
}

impl Chunk {
    /// Create a chunk; the declared length is taken from the payload
    pub fn new(index: u32, payload: Bytes, start: bool, end: bool) -> Self {
        Self {
            index,
            declared_length: payload.len() as u32,
            start,
            end,
            payload,
        }
    }

    /// Same sequence metadata, different bytes of the same length
    pub fn with_payload(&self, payload: Bytes) -> Self {
        Self {
            index: self.index,
            declared_length: payload.len() as u32,
            start: self.start,
            end: self.end,
            payload,
        }
    }

    /// Size of the serialized chunk
    pub fn wire_size(&self) -> usize {
        CHUNK_HEADER_SIZE + self.payload.len()
    }
}

/// Frame header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    /// Begin marker, `0x7F` on every valid frame
    pub begin: u8,

    /// Reserved routing byte
    pub destination: u8,

    /// Multiplexed source identifier
    pub source_id: u8,

    /// Byte length of the serialized chunk
    pub length: u16,
}

impl FrameHeader {
    /// Header for a chunk of `length` serialized bytes
    pub fn new(source_id: u8, length: u16) -> Self {
        Self {
            begin: BEGIN_MARKER,
            destination: DEFAULT_DESTINATION,
            source_id,
            length,
        }
    }
}

/// A validated frame with its chunk unwrapped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,

    /// Embedded chunk
    pub chunk: Chunk,

    /// CRC-32 over the serialized chunk
    pub crc32: u32,
}

impl Frame {
    /// Source this frame belongs to
    pub fn source_id(&self) -> u8 {
        self.header.source_id
    }
}

/// One source stream to be packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStream {
    /// Source identifier written into every frame
    pub source_id: u8,

    /// Entire source contents
    pub data: Bytes,
}

impl SourceStream {
    /// Create a source stream
    pub fn new(source_id: u8, data: impl Into<Bytes>) -> Self {
        Self {
            source_id,
            data: data.into(),
        }
    }
}

/// Compute the CRC-32 (IEEE) used in frame trailers
pub fn checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_declared_length_tracks_payload() {
        let chunk = Chunk::new(3, Bytes::from_static(b"abcd"), false, false);
        assert_eq!(chunk.declared_length, 4);
        assert_eq!(chunk.wire_size(), 14);

        let swapped = chunk.with_payload(Bytes::from_static(b"zz"));
        assert_eq!(swapped.index, 3);
        assert_eq!(swapped.declared_length, 2);
    }

    #[test]
    fn test_checksum_is_ieee_crc32() {
        // Standard check value for CRC-32/ISO-HDLC
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }
}
