//! Render invocation building and task tracking.
//!
//! `command` builds structured Blender invocations (argument tokens plus an
//! environment map — nothing is assembled by string concatenation until the
//! final shell-rendering step). `task` tracks the lifecycle of the launched
//! render processes and aggregates the final report.

pub mod command;
pub mod task;
