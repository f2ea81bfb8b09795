//! Error types for qrcast operations

use thiserror::Error;

/// Format errors raised while parsing a frame or chunk.
///
/// On the decode path these are never fatal: the frame is dropped and the
/// assembler counts the rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Invalid begin marker
    #[error("Invalid begin marker: expected 0x7f, got {0:#04x}")]
    BadMarker(u8),

    /// Not enough bytes for the structure being parsed
    #[error("Incomplete frame: expected at least {expected} bytes, got {actual}")]
    IncompleteFrame {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Frame length field disagrees with the embedded chunk
    #[error("Length mismatch: header says {declared}, frame carries {actual}")]
    LengthMismatch {
        /// Length stated by the header
        declared: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Chunk declared length disagrees with its payload
    #[error("Declared chunk length {declared} does not match payload length {actual}")]
    DeclaredLengthMismatch {
        /// Length stated by the chunk header
        declared: u32,
        /// Payload bytes actually present
        actual: usize,
    },

    /// CRC-32 mismatch
    #[error("Checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Checksum carried by the frame
        expected: u32,
        /// Checksum computed over the chunk
        actual: u32,
    },

    /// Chunk indices are 1-based
    #[error("Chunk index 0 is not valid")]
    ZeroIndex,

    /// Serialized chunk does not fit the 16-bit length field
    #[error("Chunk of {0} bytes exceeds the frame length field")]
    ChunkTooLarge(usize),

    /// Armored text could not be decoded
    #[error("Armor decoding failed: {0}")]
    Armor(String),

    /// Index gap would need more filler than the assembler allows
    #[error("Gap of {missing} chunks needs {bytes} filler bytes, limit is {limit}")]
    GapTooLarge {
        /// Missing chunk count
        missing: u32,
        /// Filler bytes the gap would need
        bytes: u64,
        /// Configured filler limit
        limit: usize,
    },
}

impl FrameError {
    /// Short label used when tallying rejections
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::BadMarker(_) => "bad_marker",
            FrameError::IncompleteFrame { .. } => "incomplete",
            FrameError::LengthMismatch { .. } => "length_mismatch",
            FrameError::DeclaredLengthMismatch { .. } => "declared_length_mismatch",
            FrameError::ChecksumMismatch { .. } => "checksum_mismatch",
            FrameError::ZeroIndex => "zero_index",
            FrameError::ChunkTooLarge(_) => "chunk_too_large",
            FrameError::Armor(_) => "armor",
            FrameError::GapTooLarge { .. } => "gap_too_large",
        }
    }
}

/// Fatal errors raised by the encode/decode pipeline
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error during read/write
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed frame produced where a valid one was required
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The codec could not round-trip a chunk within the retry cap
    #[error("Chunk {index} of source {source_id} was not self-decodable after {attempts} render attempts")]
    Render {
        /// Source the chunk belongs to
        source_id: u8,
        /// Chunk index
        index: u32,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Codec rejected its input outright
    #[error("Codec {codec} failed: {reason}")]
    Codec {
        /// Codec name
        codec: &'static str,
        /// Failure description
        reason: String,
    },

    /// An external tool could not be run or exited unsuccessfully
    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        /// Program name
        tool: String,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// Two input files map to the same source id
    #[error("Source id {0} is used by more than one input")]
    DuplicateSource(u8),

    /// More inputs than the one-byte source field can address
    #[error("Too many sources: {0} (at most 256)")]
    TooManySources(usize),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}
