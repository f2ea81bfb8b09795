//! Chunk and frame encoding

use crate::armor::armor;
use crate::constants::{CHUNK_HEADER_SIZE, FLAG_CLEAR, FLAG_SET, FRAME_OVERHEAD, MAX_CHUNK_WIRE_SIZE};
use crate::error::FrameError;
use crate::types::{checksum, Chunk, FrameHeader};
use bytes::{BufMut, Bytes, BytesMut};

/// Serialize a chunk
///
/// Layout:
/// 1. Index (4 bytes, big-endian)
/// 2. Declared length (4 bytes, big-endian)
/// 3. Start flag (1 byte, `'1'` or `'0'`)
/// 4. End flag (1 byte, `'1'` or `'0'`)
/// 5. Payload
pub fn encode_chunk(chunk: &Chunk) -> Bytes {
    let mut buf = BytesMut::with_capacity(CHUNK_HEADER_SIZE + chunk.payload.len());
    buf.put_u32(chunk.index);
    buf.put_u32(chunk.declared_length);
    buf.put_u8(flag_byte(chunk.start));
    buf.put_u8(flag_byte(chunk.end));
    buf.put_slice(&chunk.payload);
    buf.freeze()
}

/// Serialize a chunk into a frame for `source_id`
///
/// Layout:
/// 1. Begin marker (1 byte): 0x7F
/// 2. Destination (1 byte): 0
/// 3. Source id (1 byte)
/// 4. Chunk length (2 bytes, big-endian)
/// 5. Serialized chunk
/// 6. CRC-32 of the serialized chunk (4 bytes, big-endian)
pub fn encode_frame(source_id: u8, chunk: &Chunk) -> Result<Bytes, FrameError> {
    if chunk.index == 0 {
        return Err(FrameError::ZeroIndex);
    }

    let body = encode_chunk(chunk);
    if body.len() > MAX_CHUNK_WIRE_SIZE {
        return Err(FrameError::ChunkTooLarge(body.len()));
    }

    let header = FrameHeader::new(source_id, body.len() as u16);
    let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + body.len());

    buf.put_u8(header.begin);
    buf.put_u8(header.destination);
    buf.put_u8(header.source_id);
    buf.put_u16(header.length);
    buf.put_slice(&body);
    buf.put_u32(checksum(&body));

    Ok(buf.freeze())
}

/// Serialize and armor a frame, ready for a barcode renderer
pub fn encode_armored(source_id: u8, chunk: &Chunk) -> Result<Bytes, FrameError> {
    encode_frame(source_id, chunk).map(|frame| armor(&frame))
}

fn flag_byte(set: bool) -> u8 {
    if set {
        FLAG_SET
    } else {
        FLAG_CLEAR
    }
}

/// Builder for constructing frames by hand
pub struct FrameBuilder {
    source_id: u8,
    index: u32,
    payload: Bytes,
    start: bool,
    end: bool,
}

impl FrameBuilder {
    /// Create a builder for chunk `index`
    pub fn new(index: u32) -> Self {
        Self {
            source_id: 0,
            index,
            payload: Bytes::new(),
            start: false,
            end: false,
        }
    }

    /// Set the source id
    pub fn source(mut self, source_id: u8) -> Self {
        self.source_id = source_id;
        self
    }

    /// Set the payload
    pub fn payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// Mark as the first chunk of the source
    pub fn mark_first(mut self) -> Self {
        self.start = true;
        self
    }

    /// Mark as the last chunk of the source
    pub fn mark_last(mut self) -> Self {
        self.end = true;
        self
    }

    /// Build the chunk without encoding
    pub fn build_chunk(&self) -> Chunk {
        Chunk::new(self.index, self.payload.clone(), self.start, self.end)
    }

    /// Build and encode the frame
    pub fn build(self) -> Result<Bytes, FrameError> {
        encode_frame(self.source_id, &self.build_chunk())
    }

    /// Build, encode and armor the frame
    pub fn build_armored(self) -> Result<Bytes, FrameError> {
        encode_armored(self.source_id, &self.build_chunk())
    }
}
