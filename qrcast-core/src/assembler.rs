//! Receive-side stream reassembly
//!
//! Frames arrive in video order, possibly dropped, repeated or corrupted.
//! [`AssemblerState`] validates each one, demultiplexes by source id, discards
//! duplicates and late arrivals, fills index gaps with filler chunks, and
//! accumulates one output stream per source. A gap needing more filler than
//! the configured limit rejects the frame instead.
//!
//! Repeated video images are filtered before scanning by a
//! [`DuplicateFilter`], one per video stream.

use crate::config::{DecodeMode, DecodeOptions};
use crate::constants::{DEFAULT_MAX_GAP_BYTES, FILLER_BYTE};
use crate::decoder::decode_armored;
use crate::error::FrameError;
use crate::types::Frame;
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// What happened to one pushed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Frame failed validation and was dropped
    Rejected(FrameError),

    /// Source has not seen its start chunk yet
    NotStarted {
        /// Source id
        source_id: u8,
        /// Chunk index
        index: u32,
    },

    /// Chunk with the last applied index arrived again
    Duplicate {
        /// Source id
        source_id: u8,
        /// Chunk index
        index: u32,
    },

    /// Chunk older than the last applied index
    Stale {
        /// Source id
        source_id: u8,
        /// Chunk index
        index: u32,
    },

    /// Source already delivered its end chunk
    AlreadyFinished {
        /// Source id
        source_id: u8,
    },

    /// Chunk appended, after `filled` filler chunks for missing indices
    Appended {
        /// Source id
        source_id: u8,
        /// Chunk index
        index: u32,
        /// Filler chunks synthesized before this chunk
        filled: u32,
        /// This was the end chunk
        finished: bool,
    },
}

impl Outcome {
    /// Whether the chunk made it into a source's output
    pub fn is_appended(&self) -> bool {
        matches!(self, Outcome::Appended { .. })
    }

    /// Whether this push completed a source
    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Appended { finished: true, .. })
    }
}

/// Counters across all sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerStats {
    /// Symbols pushed into the assembler
    pub frames_seen: usize,
    /// Rejected with a checksum mismatch
    pub rejected_checksum: usize,
    /// Rejected with a length field mismatch
    pub rejected_length: usize,
    /// Rejected for any other format error
    pub rejected_other: usize,
    /// Dropped before their source started
    pub pre_start: usize,
    /// Repeats of the last applied chunk
    pub duplicates: usize,
    /// Chunks older than the last applied chunk
    pub stale: usize,
    /// Frames for sources that already finished
    pub after_end: usize,
    /// Chunks appended to an output
    pub appended: usize,
    /// Filler chunks synthesized
    pub filler_chunks: usize,
    /// Filler bytes synthesized
    pub filler_bytes: usize,
    /// Sources that delivered their end chunk
    pub finished: usize,
}

impl AssemblerStats {
    /// All rejected frames
    pub fn rejected(&self) -> usize {
        self.rejected_checksum + self.rejected_length + self.rejected_other
    }
}

/// Reassembly state of one source
#[derive(Debug, Clone, Default)]
pub struct SourceState {
    finished: bool,
    last_index: u32,
    last_declared_length: u32,
    output: BytesMut,
    chunks: usize,
    filler_chunks: usize,
    filler_bytes: usize,
}

impl SourceState {
    /// End chunk observed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Last applied chunk index (0 before the start chunk)
    pub fn last_index(&self) -> u32 {
        self.last_index
    }

    /// Bytes reassembled so far
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Chunks missing between the last applied index and `index`
    fn missing_before(&self, index: u32) -> u32 {
        index.saturating_sub(self.last_index).saturating_sub(1)
    }

    /// Filler bytes needed to cover `missing` chunks
    fn gap_bytes(&self, missing: u32) -> u64 {
        missing as u64 * self.last_declared_length as u64
    }

    fn fill_gap(&mut self, missing: u32) -> usize {
        let bytes = missing as usize * self.last_declared_length as usize;
        self.output.resize(self.output.len() + bytes, FILLER_BYTE);
        self.filler_chunks += missing as usize;
        self.filler_bytes += bytes;
        bytes
    }
}

/// A finished (or abandoned) per-source output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembledStream {
    /// Source id
    pub source_id: u8,
    /// Reassembled bytes, filler included
    pub data: Bytes,
    /// End chunk was received
    pub finished: bool,
    /// Real chunks appended
    pub chunks: usize,
    /// Filler chunks synthesized
    pub filler_chunks: usize,
    /// Filler bytes synthesized
    pub filler_bytes: usize,
}

/// Per-run reassembly state for every source in a video
#[derive(Debug, Clone)]
pub struct AssemblerState {
    sources: BTreeMap<u8, SourceState>,
    stats: AssemblerStats,
    mode: DecodeMode,
    max_gap_bytes: usize,
    stopped: bool,
}

impl AssemblerState {
    /// Create empty state with the default gap limit
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            sources: BTreeMap::new(),
            stats: AssemblerStats::default(),
            mode,
            max_gap_bytes: DEFAULT_MAX_GAP_BYTES,
            stopped: false,
        }
    }

    /// Create empty state from decode settings
    pub fn from_options(options: &DecodeOptions) -> Self {
        Self::new(options.mode).with_max_gap_bytes(options.max_gap_bytes)
    }

    /// Cap the filler synthesized for any single gap
    pub fn with_max_gap_bytes(mut self, limit: usize) -> Self {
        self.max_gap_bytes = limit;
        self
    }

    /// Counters so far
    pub fn stats(&self) -> &AssemblerStats {
        &self.stats
    }

    /// State of one source, if it has started
    pub fn source(&self, source_id: u8) -> Option<&SourceState> {
        self.sources.get(&source_id)
    }

    /// Source ids that have started, ascending
    pub fn source_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.sources.keys().copied()
    }

    /// No further frames need to be read
    ///
    /// In single mode this is set by the first finished source. In
    /// multiplexed mode the decode loop runs to the end of the video.
    pub fn is_done(&self) -> bool {
        self.stopped
    }

    /// Push one scanned symbol (armored frame text)
    pub fn push_symbol(&mut self, symbol: &[u8]) -> Outcome {
        self.stats.frames_seen += 1;
        match decode_armored(symbol) {
            Ok(frame) => self.apply(frame),
            Err(err) => self.reject(err),
        }
    }

    fn reject(&mut self, err: FrameError) -> Outcome {
        match err {
            FrameError::ChecksumMismatch { .. } => self.stats.rejected_checksum += 1,
            FrameError::LengthMismatch { .. } | FrameError::DeclaredLengthMismatch { .. } => {
                self.stats.rejected_length += 1
            }
            _ => self.stats.rejected_other += 1,
        }
        #[cfg(feature = "logging")]
        debug!("Dropping frame: {}", err);
        Outcome::Rejected(err)
    }

    fn apply(&mut self, frame: Frame) -> Outcome {
        let source_id = frame.source_id();
        let chunk = frame.chunk;
        let index = chunk.index;

        if !self.sources.contains_key(&source_id) {
            if !chunk.start {
                self.stats.pre_start += 1;
                return Outcome::NotStarted { source_id, index };
            }
            #[cfg(feature = "logging")]
            debug!("Source {} started", source_id);
            self.sources.insert(source_id, SourceState::default());
        }

        let limit = self.max_gap_bytes;
        let state = match self.sources.get_mut(&source_id) {
            Some(state) => state,
            None => return Outcome::NotStarted { source_id, index },
        };

        if state.finished {
            self.stats.after_end += 1;
            return Outcome::AlreadyFinished { source_id };
        }
        if index == state.last_index {
            self.stats.duplicates += 1;
            return Outcome::Duplicate { source_id, index };
        }
        if index < state.last_index {
            self.stats.stale += 1;
            return Outcome::Stale { source_id, index };
        }

        let filled = state.missing_before(index);
        let gap_bytes = state.gap_bytes(filled);
        if gap_bytes > limit as u64 {
            return self.reject(FrameError::GapTooLarge {
                missing: filled,
                bytes: gap_bytes,
                limit,
            });
        }
        if filled > 0 {
            #[cfg(feature = "logging")]
            warn!(
                "Source {}: chunks {}..{} missing, filled {} x {} bytes",
                source_id,
                state.last_index + 1,
                index - 1,
                filled,
                state.last_declared_length
            );
            let bytes = state.fill_gap(filled);
            self.stats.filler_chunks += filled as usize;
            self.stats.filler_bytes += bytes;
        }

        state.output.extend_from_slice(&chunk.payload);
        state.last_index = index;
        state.last_declared_length = chunk.declared_length;
        state.chunks += 1;
        self.stats.appended += 1;

        let finished = chunk.end;
        if finished {
            state.finished = true;
            self.stats.finished += 1;
            #[cfg(feature = "logging")]
            debug!(
                "Source {} finished at chunk {} ({} bytes)",
                source_id,
                index,
                state.output.len()
            );
            if self.mode == DecodeMode::Single {
                self.stopped = true;
            }
        }

        Outcome::Appended {
            source_id,
            index,
            filled,
            finished,
        }
    }

    /// Consume the state, yielding one stream per started source
    pub fn into_streams(self) -> Vec<ReassembledStream> {
        self.sources
            .into_iter()
            .map(|(source_id, state)| ReassembledStream {
                source_id,
                data: state.output.freeze(),
                finished: state.finished,
                chunks: state.chunks,
                filler_chunks: state.filler_chunks,
                filler_bytes: state.filler_bytes,
            })
            .collect()
    }
}

/// Drops video images identical to the one just before them
///
/// A video at a fixed frame rate repeats images; repeats carry nothing new.
/// Scope one filter to one video stream.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFilter {
    previous: Option<blake3::Hash>,
    skipped: usize,
}

impl DuplicateFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `image` repeats the previous image
    pub fn is_repeat(&mut self, image: &[u8]) -> bool {
        let digest = blake3::hash(image);
        let repeat = self.previous == Some(digest);
        self.previous = Some(digest);
        if repeat {
            self.skipped += 1;
        }
        repeat
    }

    /// Images skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
