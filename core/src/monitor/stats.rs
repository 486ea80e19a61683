//! Per-device render statistics.
//!
//! Updated incrementally as timing records arrive from one device's output
//! stream; read by the progress display to derive averages and ETAs. Exactly
//! one updater exists per device, so no synchronisation is needed here.

use serde::{Deserialize, Serialize};


// ---------------------------------------------------------------------------
// RenderStatistics
// ---------------------------------------------------------------------------

/// Accumulated timing for one device's chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStatistics {
    /// Completed frames so far.
    pub frame_count: usize,
    /// Sum of per-frame render times, seconds.
    pub total_time: f64,
    /// Fastest frame, seconds.
    pub min_time: Option<f64>,
    /// Slowest frame, seconds.
    pub max_time: Option<f64>,
    /// Every completed frame in arrival order.
    pub per_frame_times: Vec<(i32, f64)>,
}

impl RenderStatistics {
    pub fn new() -> Self {
        RenderStatistics::default()
    }

    /// Record one completed frame.
    pub fn record(&mut self, frame: i32, seconds: f64) {
        self.frame_count += 1;
        self.total_time += seconds;
        self.min_time = Some(match self.min_time {
            Some(min) => min.min(seconds),
            None => seconds,
        });
        self.max_time = Some(match self.max_time {
            Some(max) => max.max(seconds),
            None => seconds,
        });
        self.per_frame_times.push((frame, seconds));
    }

    /// Mean seconds per frame. Undefined until the first frame completes.
    pub fn average(&self) -> Option<f64> {
        if self.frame_count == 0 {
            return None;
        }
        Some(self.total_time / self.frame_count as f64)
    }

    /// Estimated seconds until this device's chunk finishes, floored at
    /// zero. Zero while the average is still undefined.
    pub fn eta(&self, chunk_total: i64) -> f64 {
        let average = match self.average() {
            Some(avg) => avg,
            None => return 0.0,
        };
        let remaining = chunk_total - self.frame_count as i64;
        if remaining <= 0 {
            return 0.0;
        }
        remaining as f64 * average
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
