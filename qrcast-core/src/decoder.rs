//! Frame decoding (strict mode)

use crate::armor::unarmor;
use crate::constants::{BEGIN_MARKER, CHUNK_HEADER_SIZE, CRC32_SIZE, FLAG_SET, FRAME_HEADER_SIZE, FRAME_OVERHEAD};
use crate::error::FrameError;
use crate::types::{checksum, Chunk, Frame, FrameHeader};
use bytes::Bytes;

/// Decode a serialized frame
///
/// This function performs strict validation:
/// - Validates the begin marker
/// - Validates the length field against the embedded chunk
/// - Validates the CRC-32 over the chunk bytes
/// - Validates the chunk header
///
/// Returns an error if any validation fails. The returned frame borrows its
/// payload from `buf`.
pub fn decode_frame(buf: Bytes) -> Result<Frame, FrameError> {
    if buf.len() < FRAME_OVERHEAD {
        return Err(FrameError::IncompleteFrame {
            expected: FRAME_OVERHEAD,
            actual: buf.len(),
        });
    }

    if buf[0] != BEGIN_MARKER {
        return Err(FrameError::BadMarker(buf[0]));
    }

    let header = FrameHeader {
        begin: buf[0],
        destination: buf[1],
        source_id: buf[2],
        length: u16::from_be_bytes([buf[3], buf[4]]),
    };

    let trailer_start = buf.len() - CRC32_SIZE;
    let actual_len = trailer_start - FRAME_HEADER_SIZE;
    if header.length as usize != actual_len {
        return Err(FrameError::LengthMismatch {
            declared: header.length as usize,
            actual: actual_len,
        });
    }

    let expected = u32::from_be_bytes([
        buf[trailer_start],
        buf[trailer_start + 1],
        buf[trailer_start + 2],
        buf[trailer_start + 3],
    ]);
    let body = buf.slice(FRAME_HEADER_SIZE..trailer_start);
    let actual = checksum(&body);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    let chunk = decode_chunk(body)?;

    Ok(Frame {
        header,
        chunk,
        crc32: expected,
    })
}

/// Decode a frame from a byte slice
pub fn decode_frame_from_bytes(data: &[u8]) -> Result<Frame, FrameError> {
    decode_frame(Bytes::copy_from_slice(data))
}

/// De-armor scanner output and decode the frame inside it
pub fn decode_armored(text: &[u8]) -> Result<Frame, FrameError> {
    decode_frame(unarmor(text)?)
}

/// Decode a serialized chunk
pub fn decode_chunk(buf: Bytes) -> Result<Chunk, FrameError> {
    if buf.len() < CHUNK_HEADER_SIZE {
        return Err(FrameError::IncompleteFrame {
            expected: CHUNK_HEADER_SIZE,
            actual: buf.len(),
        });
    }

    let index = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if index == 0 {
        return Err(FrameError::ZeroIndex);
    }

    let declared_length = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let start = buf[8] == FLAG_SET;
    let end = buf[9] == FLAG_SET;
    let payload = buf.slice(CHUNK_HEADER_SIZE..);

    if declared_length as usize != payload.len() {
        return Err(FrameError::DeclaredLengthMismatch {
            declared: declared_length,
            actual: payload.len(),
        });
    }

    Ok(Chunk {
        index,
        declared_length,
        start,
        end,
        payload,
    })
}
