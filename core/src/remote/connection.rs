//! SSH connection state tracking.
//!
//! `ConnectionTracker` maintains per-host connection state and attempt/latency
//! bookkeeping for the preflight probe. No sockets are opened here — this is
//! pure state driven by the orchestrator's `check_host`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};


// ---------------------------------------------------------------------------
// ConnState
// ---------------------------------------------------------------------------

/// The current state of the connection to a render host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnState {
    /// No probe has been attempted.
    Disconnected,
    /// A probe is in progress.
    Connecting {
        /// Epoch-millisecond timestamp when the probe started.
        since_ms: u64,
    },
    /// The last probe succeeded.
    Connected {
        /// Epoch-millisecond timestamp of the successful probe.
        since_ms: u64,
    },
    /// The last probe failed.
    Failed {
        /// Human-readable failure reason.
        reason: String,
        /// Epoch-millisecond timestamp of the failure.
        at_ms: u64,
    },
}


// ---------------------------------------------------------------------------
// ConnectionInfo
// ---------------------------------------------------------------------------

/// Connection metadata for a single host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Name of the host this info belongs to.
    pub host: String,
    /// Current connection state.
    pub state: ConnState,
    /// Total number of probe attempts (successful or not).
    pub attempts: u32,
    /// Round-trip latency measured during the last successful probe.
    pub latency_ms: Option<u64>,
}


// ---------------------------------------------------------------------------
// ConnectionTracker
// ---------------------------------------------------------------------------

/// Tracks connection state for every known host.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    connections: HashMap<String, ConnectionInfo>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        ConnectionTracker {
            connections: HashMap::new(),
        }
    }

    /// Ensure a host is tracked. Idempotent; existing state is preserved.
    pub fn register(&mut self, host: &str) {
        self.connections
            .entry(host.to_string())
            .or_insert_with(|| ConnectionInfo {
                host: host.to_string(),
                state: ConnState::Disconnected,
                attempts: 0,
                latency_ms: None,
            });
    }

    /// Mark a probe as started. Increments the attempt counter.
    pub fn start_connecting(&mut self, host: &str, now_ms: u64) -> Result<(), String> {
        let info = self
            .connections
            .get_mut(host)
            .ok_or_else(|| format!("host '{}' not tracked", host))?;
        info.attempts += 1;
        info.state = ConnState::Connecting { since_ms: now_ms };
        Ok(())
    }

    /// Record a successful probe with its measured latency.
    pub fn mark_connected(&mut self, host: &str, now_ms: u64, latency_ms: u64) -> Result<(), String> {
        let info = self
            .connections
            .get_mut(host)
            .ok_or_else(|| format!("host '{}' not tracked", host))?;
        info.state = ConnState::Connected { since_ms: now_ms };
        info.latency_ms = Some(latency_ms);
        Ok(())
    }

    /// Record a failed probe.
    pub fn mark_failed(&mut self, host: &str, reason: &str, now_ms: u64) -> Result<(), String> {
        let info = self
            .connections
            .get_mut(host)
            .ok_or_else(|| format!("host '{}' not tracked", host))?;
        info.state = ConnState::Failed {
            reason: reason.to_string(),
            at_ms: now_ms,
        };
        Ok(())
    }

    /// Current state of a host, if tracked.
    pub fn state(&self, host: &str) -> Option<&ConnState> {
        self.connections.get(host).map(|i| &i.state)
    }

    /// Full info for a host, if tracked.
    pub fn info(&self, host: &str) -> Option<&ConnectionInfo> {
        self.connections.get(host)
    }

    /// Whether the last probe of this host succeeded.
    pub fn is_connected(&self, host: &str) -> bool {
        matches!(self.state(host), Some(ConnState::Connected { .. }))
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
