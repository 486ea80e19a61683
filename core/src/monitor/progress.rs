//! Progress projection and text rendering.
//!
//! `ProgressSnapshot` is a read-only view of one task's live state, derived
//! from the task set and the per-device statistics. The display layers (CLI
//! text, TUI gauges) consume snapshots; nothing here feeds back into
//! scheduling or partitioning.

use serde::{Deserialize, Serialize};

use crate::monitor::stats::RenderStatistics;
use crate::render::task::{RenderTask, TaskStatus};


// ---------------------------------------------------------------------------
// ProgressSnapshot
// ---------------------------------------------------------------------------

/// Live progress of one render task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Task label, e.g. "gpu1 [26-50]".
    pub label: String,
    /// Index of the pinned device.
    pub device_index: u32,
    /// Frames completed so far.
    pub done: usize,
    /// Frames in this task's chunk.
    pub total: i64,
    /// Mean seconds per frame, once at least one frame completed.
    pub average: Option<f64>,
    /// Estimated seconds remaining, floored at zero.
    pub eta_seconds: f64,
    /// Current task status.
    pub status: TaskStatus,
}

impl ProgressSnapshot {
    /// Build a snapshot from a task and its statistics.
    pub fn capture(task: &RenderTask, stats: &RenderStatistics) -> Self {
        let total = task.range.total();
        ProgressSnapshot {
            label: task.label.clone(),
            device_index: task.device_index,
            done: stats.frame_count,
            total,
            average: stats.average(),
            eta_seconds: stats.eta(total),
            status: task.status,
        }
    }

    /// Completed fraction in `[0.0, 1.0]`.
    pub fn ratio(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64).clamp(0.0, 1.0)
    }
}


// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Render a bracketed progress bar of the given `width` filled to `fraction`.
pub fn progress_bar(width: usize, fraction: f64) -> String {
    let fraction = fraction.clamp(0.0, 1.0);
    if width < 2 {
        return String::new();
    }
    let inner = width - 2;
    let filled = (fraction * inner as f64).round() as usize;

    let mut bar = String::with_capacity(width);
    bar.push('[');
    for _ in 0..filled {
        bar.push('#');
    }
    for _ in filled..inner {
        bar.push('.');
    }
    bar.push(']');
    bar
}

/// Format a duration in seconds as `SSs` or `MMm SSs`.
pub fn format_eta(seconds: f64) -> String {
    let secs = seconds.max(0.0).round() as u64;
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// One compact status line for a snapshot, used by the plain CLI display.
pub fn render_line(snap: &ProgressSnapshot) -> String {
    let bar = progress_bar(22, snap.ratio());
    let avg = match snap.average {
        Some(avg) => format!("{:.1}s/frame", avg),
        None => "--".to_string(),
    };
    match snap.status {
        TaskStatus::Succeeded => format!("gpu{} {} {}/{} done", snap.device_index, bar, snap.done, snap.total),
        TaskStatus::Failed => format!("gpu{} {} {}/{} FAILED", snap.device_index, bar, snap.done, snap.total),
        _ => format!(
            "gpu{} {} {}/{} {} eta {}",
            snap.device_index,
            bar,
            snap.done,
            snap.total,
            avg,
            format_eta(snap.eta_seconds)
        ),
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
