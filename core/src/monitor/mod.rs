//! Monitoring subsystem — render output parsing, statistics, progress.
//!
//! The `timing` module extracts per-frame render durations from a task's raw
//! output stream. The `stats` module accumulates them into per-device
//! statistics (count, total, min/max, average, ETA). The `progress` module
//! projects live state into read-only snapshots for display; it never feeds
//! back into scheduling or partitioning.

pub mod progress;
pub mod stats;
pub mod timing;
