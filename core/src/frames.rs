//! Frame ranges and chunk partitioning.
//!
//! A `FrameRange` is an inclusive interval of animation frames. `partition`
//! splits a range into contiguous, non-overlapping sub-ranges — one per
//! render device — using ceiling division so the earlier devices absorb the
//! remainder. Chunks are produced once, consumed once by the launcher, and
//! never mutated afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;
use crate::gpu::Device;


// ---------------------------------------------------------------------------
// FrameRange
// ---------------------------------------------------------------------------

/// An inclusive interval of animation frames. Invariant: `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i32,
    pub end: i32,
}

impl FrameRange {
    /// Construct a validated range. Fails when `end < start`.
    pub fn new(start: i32, end: i32) -> Result<Self, OrchestratorError> {
        if end < start {
            return Err(OrchestratorError::InvalidRange { start, end });
        }
        Ok(FrameRange { start, end })
    }

    /// Number of frames in the range. Widens to `i64` so extreme ranges
    /// cannot overflow the count.
    pub fn total(&self) -> i64 {
        self.end as i64 - self.start as i64 + 1
    }

    /// Whether this range covers exactly one frame (the single-frame CLI
    /// shape downstream).
    pub fn is_single_frame(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}


// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// A contiguous sub-range of frames assigned to one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub device: Device,
    pub range: FrameRange,
}

impl Chunk {
    /// Human-readable identity used in task labels and failure reports.
    pub fn label(&self) -> String {
        format!("gpu{} [{}]", self.device.index, self.range)
    }
}


// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Split `range` into at most `device_count` contiguous sub-ranges.
///
/// With one device (or a single frame) the whole range becomes one chunk.
/// Otherwise each sub-range holds `ceil(total / device_count)` frames and
/// assignment stops once the range is exhausted, so `device_count > total`
/// yields exactly `total` one-frame chunks.
pub fn partition(range: FrameRange, device_count: usize) -> Vec<FrameRange> {
    let total = range.total();
    if device_count <= 1 || total <= 1 {
        return vec![range];
    }

    let count = device_count as i64;
    let chunk_size = (total + count - 1) / count;

    let mut chunks = Vec::new();
    let mut cursor = range.start as i64;
    for _ in 0..device_count {
        if cursor > range.end as i64 {
            break;
        }
        let chunk_end = (cursor + chunk_size - 1).min(range.end as i64);
        chunks.push(FrameRange {
            start: cursor as i32,
            end: chunk_end as i32,
        });
        cursor = chunk_end + 1;
    }
    chunks
}

/// Pair sub-ranges with devices in enumeration order.
///
/// `partition` never produces more sub-ranges than devices, so the zip is
/// total on the range side; surplus devices simply receive no chunk.
pub fn assign(ranges: Vec<FrameRange>, devices: &[Device]) -> Vec<Chunk> {
    ranges
        .into_iter()
        .zip(devices.iter().cloned())
        .map(|(range, device)| Chunk { device, range })
        .collect()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
