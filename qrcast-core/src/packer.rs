//! Chunking and frame packing
//!
//! Sources are sliced into fixed-size chunks and interleaved in time-division
//! order: round `t` emits chunk `t + 1` of every source that still has data,
//! in ascending source-id order.

use crate::encoder::encode_armored;
use crate::error::{FrameError, TransportError};
use crate::types::{Chunk, SourceStream};
use bytes::Bytes;
use std::collections::BTreeSet;

/// Iterator over the chunks of one source
#[derive(Debug, Clone)]
pub struct Chunks {
    data: Bytes,
    chunk_size: usize,
    offset: usize,
    index: u32,
}

impl Chunks {
    /// Slice `data` into chunks of `chunk_size` bytes (the last may be shorter)
    pub fn new(data: Bytes, chunk_size: usize) -> Self {
        Self {
            data,
            chunk_size: chunk_size.max(1),
            offset: 0,
            index: 0,
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.offset >= self.data.len() {
            return None;
        }

        let end = (self.offset + self.chunk_size).min(self.data.len());
        self.index += 1;
        let chunk = Chunk::new(
            self.index,
            self.data.slice(self.offset..end),
            self.index == 1,
            end == self.data.len(),
        );
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.data.len() - self.offset.min(self.data.len())).div_ceil(self.chunk_size);
        (left, Some(left))
    }
}

/// A chunk packed into an armored frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFrame {
    /// Source the chunk belongs to
    pub source_id: u8,

    /// The chunk carried by the frame
    pub chunk: Chunk,

    /// Armored frame bytes handed to the barcode renderer
    pub wire: Bytes,
}

impl PackedFrame {
    /// Pack a chunk for `source_id`
    pub fn pack(source_id: u8, chunk: Chunk) -> Result<Self, FrameError> {
        let wire = encode_armored(source_id, &chunk)?;
        Ok(Self {
            source_id,
            chunk,
            wire,
        })
    }

    /// Repack with the same sequence metadata and different content
    pub fn repack(&self, payload: Bytes) -> Result<Self, FrameError> {
        Self::pack(self.source_id, self.chunk.with_payload(payload))
    }
}

struct Lane {
    source_id: u8,
    chunks: Chunks,
}

/// Multiplexing frame packer
pub struct FramePacker {
    lanes: Vec<Lane>,
    cursor: usize,
    remaining: usize,
}

impl FramePacker {
    /// Create a packer over `sources`
    ///
    /// Fails if two sources share an id.
    pub fn new(sources: Vec<SourceStream>, chunk_size: usize) -> Result<Self, TransportError> {
        let mut seen = BTreeSet::new();
        for source in &sources {
            if !seen.insert(source.source_id) {
                return Err(TransportError::DuplicateSource(source.source_id));
            }
        }

        let mut lanes: Vec<Lane> = sources
            .into_iter()
            .map(|s| Lane {
                source_id: s.source_id,
                chunks: Chunks::new(s.data, chunk_size),
            })
            .collect();
        lanes.sort_by_key(|lane| lane.source_id);

        let remaining = lanes.iter().map(|lane| lane.chunks.size_hint().0).sum();

        Ok(Self {
            lanes,
            cursor: 0,
            remaining,
        })
    }

    /// Frames still to be produced
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for FramePacker {
    type Item = Result<PackedFrame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        let lanes = self.lanes.len();
        for _ in 0..lanes {
            let at = self.cursor;
            self.cursor = (self.cursor + 1) % lanes;

            let lane = &mut self.lanes[at];
            if let Some(chunk) = lane.chunks.next() {
                self.remaining -= 1;
                return Some(PackedFrame::pack(lane.source_id, chunk));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
