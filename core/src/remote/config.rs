//! Render host configuration and registry.
//!
//! `RemoteConfig` describes a single render host (SSH coordinates, workspace
//! path, labels). `HostRegistry` stores the known hosts with an optional
//! default and round-trips through a `hosts.yaml` file. The GPU count of a
//! host is never configured here — devices are discovered live at the start
//! of each orchestration run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;


// ---------------------------------------------------------------------------
// RemoteConfig
// ---------------------------------------------------------------------------

/// Configuration for a single render host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// Short name used to reference this host (e.g. "r1", "gpu-a100").
    pub name: String,
    /// Hostname or IP address.
    pub host: String,
    /// SSH port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH user.
    pub user: String,
    /// Path to an SSH private key, if not using the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,
    /// Working directory on the host; render output lands beneath it.
    pub workspace_dir: String,
    /// Arbitrary labels for filtering (e.g. "a100", "spot").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

fn default_port() -> u16 {
    22
}

impl RemoteConfig {
    /// Build the `user@host` string used in SSH/scp commands.
    pub fn user_at_host(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Build base SSH arguments (port, key, user@host) without a command.
    pub fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(ref key) = self.ssh_key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args.push(self.user_at_host());
        args
    }

    /// Build base scp arguments. scp spells the port flag `-P` and takes the
    /// source/destination operands separately.
    pub fn scp_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-P".to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
        ];
        if let Some(ref key) = self.ssh_key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }
}


// ---------------------------------------------------------------------------
// HostRegistry
// ---------------------------------------------------------------------------

/// A collection of render host configurations with an optional default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostRegistry {
    #[serde(default)]
    hosts: Vec<RemoteConfig>,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    default_host: Option<String>,
}

impl HostRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        HostRegistry {
            hosts: Vec::new(),
            default_host: None,
        }
    }

    /// Add a host. Fails if a host with the same name already exists.
    pub fn add(&mut self, config: RemoteConfig) -> Result<(), String> {
        if self.hosts.iter().any(|h| h.name == config.name) {
            return Err(format!("host '{}' already exists", config.name));
        }
        self.hosts.push(config);
        Ok(())
    }

    /// Remove a host by name, returning it. Clears the default if it matched.
    pub fn remove(&mut self, name: &str) -> Result<RemoteConfig, String> {
        let idx = self
            .hosts
            .iter()
            .position(|h| h.name == name)
            .ok_or_else(|| format!("host '{}' not found", name))?;
        let removed = self.hosts.remove(idx);
        if self.default_host.as_deref() == Some(name) {
            self.default_host = None;
        }
        Ok(removed)
    }

    /// Look up a host by name.
    pub fn get(&self, name: &str) -> Option<&RemoteConfig> {
        self.hosts.iter().find(|h| h.name == name)
    }

    /// Return all registered hosts.
    pub fn list(&self) -> &[RemoteConfig] {
        &self.hosts
    }

    /// The name of the current default host, if set.
    pub fn default_name(&self) -> Option<&str> {
        self.default_host.as_deref()
    }

    /// Set the default host. Fails if the named host does not exist.
    pub fn set_default(&mut self, name: &str) -> Result<(), String> {
        if !self.hosts.iter().any(|h| h.name == name) {
            return Err(format!("host '{}' not found", name));
        }
        self.default_host = Some(name.to_string());
        Ok(())
    }

    /// Return all hosts that carry the given label.
    pub fn by_label(&self, label: &str) -> Vec<&RemoteConfig> {
        self.hosts
            .iter()
            .filter(|h| h.labels.iter().any(|l| l == label))
            .collect()
    }

    /// Load a registry from a YAML file. A default naming an unknown host is
    /// rejected.
    pub fn load(path: &Path) -> Result<HostRegistry, OrchestratorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let registry: HostRegistry = serde_yaml::from_str(&content).map_err(|e| {
            OrchestratorError::Config(format!("{}: {}", path.display(), e))
        })?;
        if let Some(ref def) = registry.default_host {
            if !registry.hosts.iter().any(|h| h.name == *def) {
                return Err(OrchestratorError::Config(format!(
                    "{}: default host '{}' not found in hosts list",
                    path.display(),
                    def
                )));
            }
        }
        Ok(registry)
    }

    /// Save the registry to a YAML file.
    pub fn save(&self, path: &Path) -> Result<(), OrchestratorError> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| OrchestratorError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| {
            OrchestratorError::Config(format!("cannot write {}: {}", path.display(), e))
        })
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
