use std::fmt;

// ---------------------------------------------------------------------------
// Orchestrator errors
// ---------------------------------------------------------------------------

/// Fatal and per-task error conditions raised by the orchestration core.
///
/// `DeviceQuery`, `InvalidRange`, `HostNotFound`, `NoDevices`, and `Config`
/// are fatal: they abort an orchestration run before any render process is
/// launched. `TaskSpawn` is recorded against the affected task instead of
/// being raised — a spawn failure never aborts sibling tasks.
#[derive(Debug)]
pub enum OrchestratorError {
    /// The device query tool failed or the host was unreachable.
    DeviceQuery(String),
    /// End frame precedes start frame.
    InvalidRange { start: i32, end: i32 },
    /// No host with the given name is registered.
    HostNotFound(String),
    /// The preflight probe of a host failed.
    HostUnreachable { host: String, reason: String },
    /// Device enumeration returned nothing on the named host.
    NoDevices(String),
    /// A render process for one chunk could not be started.
    TaskSpawn { label: String, reason: String },
    /// Configuration file or registry problem.
    Config(String),
    /// Output collection (archive/fetch) failed.
    Collect(String),
    /// Filesystem I/O error.
    Io(std::io::Error),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::DeviceQuery(msg) => {
                write!(f, "device query failed: {}", msg)
            }
            OrchestratorError::InvalidRange { start, end } => {
                write!(f, "invalid frame range: end {} precedes start {}", end, start)
            }
            OrchestratorError::HostNotFound(name) => {
                write!(f, "host '{}' is not configured", name)
            }
            OrchestratorError::HostUnreachable { host, reason } => {
                write!(f, "host '{}' unreachable: {}", host, reason)
            }
            OrchestratorError::NoDevices(host) => {
                write!(f, "no render devices found on host '{}'", host)
            }
            OrchestratorError::TaskSpawn { label, reason } => {
                write!(f, "failed to start render task {}: {}", label, reason)
            }
            OrchestratorError::Config(msg) => write!(f, "config error: {}", msg),
            OrchestratorError::Collect(msg) => write!(f, "collect failed: {}", msg),
            OrchestratorError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for OrchestratorError {}

impl From<std::io::Error> for OrchestratorError {
    fn from(e: std::io::Error) -> Self {
        OrchestratorError::Io(e)
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_range() {
        let err = OrchestratorError::InvalidRange { start: 10, end: 3 };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("3"));
    }

    #[test]
    fn display_task_spawn_keeps_label() {
        let err = OrchestratorError::TaskSpawn {
            label: "gpu2 [51-75]".to_string(),
            reason: "ssh: connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("gpu2 [51-75]"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: OrchestratorError = io.into();
        assert!(matches!(err, OrchestratorError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}
