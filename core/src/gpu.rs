//! Remote GPU discovery.
//!
//! Devices are enumerated once per orchestration run by invoking the device
//! query tool on the target host and splitting its stdout into lines. The
//! output is treated as authoritative and is not parsed beyond line-splitting
//! and trimming. The result is exhaustive and static for the duration of the
//! run — no re-polling mid-render.

use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;
use crate::infrastructure::runner::CommandRunner;
use crate::remote::config::RemoteConfig;


/// The query command executed on the remote host. One device per line.
pub const DEVICE_QUERY: &str = "nvidia-smi --list-gpus";


// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// A compute device discovered on the render host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Position in the enumeration order; also the index used for pinning.
    pub index: u32,
    /// The query tool's description line for this device, verbatim.
    pub name: String,
}


// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// Enumerate the GPUs visible on `host`.
///
/// An empty list is a valid result (the host has no GPUs) and is distinct
/// from a query failure, which surfaces as `DeviceQuery` and aborts the run
/// before any task is launched.
pub fn list_devices(
    runner: &dyn CommandRunner,
    host: &RemoteConfig,
) -> Result<Vec<Device>, OrchestratorError> {
    let cmd = format!("ssh {} {}", host.ssh_base_args().join(" "), DEVICE_QUERY);
    let output = runner.run(&cmd).map_err(OrchestratorError::DeviceQuery)?;
    Ok(parse_device_list(&output))
}

/// Parse device query output: one device per non-empty line, trimmed.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| Device {
            index: i as u32,
            name: line.to_string(),
        })
        .collect()
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
