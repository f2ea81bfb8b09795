//! Bit-level accuracy scoring
//!
//! The diff artifact holds one byte per position: `!(original ^ received)`
//! where both streams have a byte, `0x00` where only one does. Its set bits
//! are the matching bits.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outcome of comparing a reconstruction against its original
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyReport {
    /// Per-position match mask
    pub diff: Bytes,

    /// Summary figures
    pub summary: AccuracySummary,
}

/// Numbers describing one comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    /// Length of the original stream
    pub original_len: usize,

    /// Length of the reconstructed stream
    pub received_len: usize,

    /// Matching bits across the diff artifact
    pub matching_bits: u64,

    /// Bits compared (eight per diff byte)
    pub total_bits: u64,

    /// Fraction of matching bits relative to the original
    pub score: f64,
}

impl AccuracyReport {
    /// Score as a percentage
    pub fn percentage(&self) -> f64 {
        self.summary.score * 100.0
    }

    /// Write the diff artifact
    pub fn write_diff<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        fs::write(path, &self.diff)
    }
}

/// Compare `original` against `received`
///
/// `score = ones(diff) / (8 × original.len())`. A reconstruction longer than
/// the original is measured against its own length instead, so trailing
/// extra bytes lower the score. Empty originals score 1.0 against an empty
/// reconstruction and 0.0 otherwise.
pub fn compare(original: &[u8], received: &[u8]) -> AccuracyReport {
    let longest = original.len().max(received.len());
    let mut diff = BytesMut::with_capacity(longest);
    let mut matching_bits = 0u64;

    for (a, b) in original.iter().zip(received.iter()) {
        let same = !(a ^ b);
        matching_bits += same.count_ones() as u64;
        diff.put_u8(same);
    }
    diff.put_bytes(0, longest - original.len().min(received.len()));

    let total_bits = 8 * longest as u64;
    let score = if total_bits == 0 {
        1.0
    } else {
        matching_bits as f64 / total_bits as f64
    };

    AccuracyReport {
        diff: diff.freeze(),
        summary: AccuracySummary {
            original_len: original.len(),
            received_len: received.len(),
            matching_bits,
            total_bits,
            score,
        },
    }
}
