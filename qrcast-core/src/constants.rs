//! Constants and limits for the qrcast wire format

/// Frame begin marker. The high bit is clear so the byte never reads as
/// negative when a scanner hands it back as a signed char.
pub const BEGIN_MARKER: u8 = 0x7F;

/// Destination byte. Routing is reserved and always zero.
pub const DEFAULT_DESTINATION: u8 = 0;

/// Frame header size: begin (1) + destination (1) + source (1) + length (2)
pub const FRAME_HEADER_SIZE: usize = 5;

/// Size of the CRC-32 trailer in bytes
pub const CRC32_SIZE: usize = 4;

/// Bytes a frame adds around its chunk (header + trailer)
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + CRC32_SIZE;

/// Chunk header size: index (4) + declared length (4) + start (1) + end (1)
pub const CHUNK_HEADER_SIZE: usize = 10;

/// The 16-bit length field caps the serialized chunk
pub const MAX_CHUNK_WIRE_SIZE: usize = u16::MAX as usize;

/// Largest payload that still fits the 16-bit frame length field
pub const MAX_CHUNK_PAYLOAD: usize = MAX_CHUNK_WIRE_SIZE - CHUNK_HEADER_SIZE;

/// Flag byte written for a set start/end flag
pub const FLAG_SET: u8 = b'1';

/// Flag byte written for a clear start/end flag
pub const FLAG_CLEAR: u8 = b'0';

/// Byte used to synthesize chunks that were never received
pub const FILLER_BYTE: u8 = b'a';

/// Practical per-barcode payload ceiling (chunk bytes) for the built-in codecs
pub const CODEC_CAP: usize = 512;

/// Default maximum transmission unit in bytes
pub const DEFAULT_MTU: usize = 1024;

/// Default video frame rate
pub const DEFAULT_FPS: u32 = 10;

/// Default number of render attempts before a chunk is declared unrenderable
pub const DEFAULT_MAX_RENDER_ATTEMPTS: u32 = 8;

/// Default cap on filler bytes synthesized for a single index gap (1 MiB)
pub const DEFAULT_MAX_GAP_BYTES: usize = 1 << 20;

/// Scratch subdirectory holding rendered barcodes
pub const RENDER_DIR_NAME: &str = "qr_codes";

/// Scratch subdirectory holding images split out of a video
pub const FRAMES_DIR_NAME: &str = "frames";

/// File name of the n-th rendered barcode (1-based)
pub fn rendered_image_name(n: usize, extension: &str) -> String {
    format!("qrCode_{}.{}", n, extension)
}

/// File name of the n-th extracted video frame (1-based, zero padded)
pub fn extracted_frame_name(n: usize) -> String {
    format!("frame_{:05}.pgm", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overhead_matches_layout() {
        assert_eq!(FRAME_OVERHEAD, 9);
        assert_eq!(CHUNK_HEADER_SIZE, 10);
        assert!(BEGIN_MARKER < 0x80);
    }

    #[test]
    fn test_scratch_names() {
        assert_eq!(rendered_image_name(1, "png"), "qrCode_1.png");
        assert_eq!(extracted_frame_name(7), "frame_00007.pgm");
    }
}
