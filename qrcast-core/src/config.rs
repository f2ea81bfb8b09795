//! Run configuration

use crate::constants::{
    DEFAULT_FPS, DEFAULT_MAX_GAP_BYTES, DEFAULT_MAX_RENDER_ATTEMPTS, DEFAULT_MTU,
};
use serde::{Deserialize, Serialize};

/// Barcode codec selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// QR codes through the `qrencode` and `zbarimg` tools
    #[default]
    Qr,
    /// Built-in binary raster grid
    Raster,
}

/// When the decode loop stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Stop as soon as any source has delivered its end chunk
    Single,
    /// Keep reading to the end of the video so every source can finish
    #[default]
    Multiplexed,
}

/// Encode-side settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Target video length in milliseconds
    pub duration_ms: u64,

    /// Maximum transmission unit in bytes
    pub mtu: usize,

    /// Video frame rate
    pub fps: u32,

    /// Codec used to render frames
    pub codec: CodecKind,

    /// Render attempts per chunk before the run fails
    pub max_render_attempts: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            duration_ms: 1000,
            mtu: DEFAULT_MTU,
            fps: DEFAULT_FPS,
            codec: CodecKind::default(),
            max_render_attempts: DEFAULT_MAX_RENDER_ATTEMPTS,
        }
    }
}

/// Decode-side settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Frame rate used to sample the video
    pub fps: u32,

    /// Codec used to scan frames
    pub codec: CodecKind,

    /// Stop policy
    pub mode: DecodeMode,

    /// Filler bytes allowed for a single index gap
    pub max_gap_bytes: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            codec: CodecKind::default(),
            mode: DecodeMode::default(),
            max_gap_bytes: DEFAULT_MAX_GAP_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let encode = EncodeOptions::default();
        assert_eq!(encode.mtu, 1024);
        assert_eq!(encode.fps, 10);
        assert_eq!(encode.max_render_attempts, 8);

        let decode = DecodeOptions::default();
        assert_eq!(decode.mode, DecodeMode::Multiplexed);
        assert_eq!(decode.codec, CodecKind::Qr);
        assert_eq!(decode.max_gap_bytes, 1 << 20);
    }
}
