//! Blendrig core — remote multi-GPU Blender render orchestration.
//!
//! Given an SSH-reachable render host, this crate discovers its GPUs, splits
//! an inclusive frame range into one contiguous chunk per device, launches
//! one pinned Blender process per chunk, tracks completion, and aggregates
//! the result. Per-frame timing can be parsed from the live output streams
//! to drive a progress display.
//!
//! # Modules
//!
//! - [`frames`] — frame ranges, chunks, and the partitioner
//! - [`gpu`] — remote device enumeration
//! - [`render`] — Blender invocation building and task tracking
//! - [`monitor`] — timing parser, statistics, progress snapshots
//! - [`remote`] — host registry, connection tracking, output collection
//! - [`orchestrator`] — the side-effecting integration layer
//! - [`infrastructure`] — runner/launcher traits with shell and mock backends
//! - [`config`] / [`errors`] — orchestrator configuration and error taxonomy
//! - [`command`] / [`cli`] — the typed CLI surface

pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod frames;
pub mod gpu;
pub mod infrastructure;
pub mod monitor;
pub mod orchestrator;
pub mod remote;
pub mod render;
