//! Chunk size planning
//!
//! The planner spreads the total payload over the frame budget of the
//! requested video (`duration × fps`) while keeping every chunk inside what
//! one barcode can carry reliably and inside the configured transmission unit.

use crate::constants::{FRAME_OVERHEAD, MAX_CHUNK_PAYLOAD};
use serde::{Deserialize, Serialize};

/// Which bound decided the chunk size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanLimit {
    /// The payload spread evenly over the frame budget
    Budget,
    /// The barcode capacity ceiling
    Codec,
    /// The transmission unit ceiling
    Mtu,
    /// The one-byte floor
    Floor,
}

/// Result of planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlan {
    /// Bytes per chunk
    pub chunk_size: usize,

    /// Frames the video is expected to hold
    pub frame_budget: u64,

    /// Bound that produced `chunk_size`
    pub limit: PlanLimit,
}

impl ChunkPlan {
    /// Number of chunks a source of `len` bytes splits into
    pub fn chunks_for(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Total frames for a set of sources of the given lengths
    pub fn frames_for<I: IntoIterator<Item = usize>>(&self, lens: I) -> usize {
        lens.into_iter().map(|len| self.chunks_for(len)).sum()
    }
}

/// Frames available in a video of `duration_ms` at `fps`, never below one
pub fn frame_budget(duration_ms: u64, fps: u32) -> u64 {
    (duration_ms.saturating_mul(fps as u64) / 1000).max(1)
}

/// Compute the chunk size
///
/// `chunk_size = clamp(ceil(total / budget), 1, min(codec_cap, mtu - FRAME_OVERHEAD))`.
/// When the ceiling collapses below one byte the floor wins.
pub fn plan_chunk_size(total_size: usize, frame_budget: u64, mtu_bytes: usize, codec_cap: usize) -> ChunkPlan {
    let frame_budget = frame_budget.max(1);
    let spread = (total_size as u64).div_ceil(frame_budget) as usize;

    let mtu_room = mtu_bytes.saturating_sub(FRAME_OVERHEAD);
    let codec_room = codec_cap.min(MAX_CHUNK_PAYLOAD);
    let (ceiling, ceiling_limit) = if codec_room <= mtu_room {
        (codec_room, PlanLimit::Codec)
    } else {
        (mtu_room, PlanLimit::Mtu)
    };

    let (chunk_size, limit) = if spread > ceiling {
        (ceiling, ceiling_limit)
    } else {
        (spread, PlanLimit::Budget)
    };

    if chunk_size == 0 {
        return ChunkPlan {
            chunk_size: 1,
            frame_budget,
            limit: PlanLimit::Floor,
        };
    }

    ChunkPlan {
        chunk_size,
        frame_budget,
        limit,
    }
}
