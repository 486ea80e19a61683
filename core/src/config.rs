//! Orchestrator configuration.
//!
//! One explicit struct passed into the orchestrator constructor — there is
//! no process-wide mutable state. All fields have defaults so a missing
//! config file is not an error; `load` reads the YAML overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::OrchestratorError;


// ---------------------------------------------------------------------------
// OrchestratorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Blender binary on the render host.
    #[serde(default = "default_blender_binary")]
    pub blender_binary: String,
    /// Default render engine.
    #[serde(default = "default_engine")]
    pub default_engine: String,
    /// Default image format.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Default output path template, relative to the host workspace.
    #[serde(default = "default_output")]
    pub default_output: String,
    /// How often the join loop polls children and refreshes progress.
    /// Display pacing only — never correctness-relevant.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_blender_binary() -> String {
    "blender".to_string()
}

fn default_engine() -> String {
    "CYCLES".to_string()
}

fn default_format() -> String {
    "PNG".to_string()
}

fn default_output() -> String {
    "output/render_".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            blender_binary: default_blender_binary(),
            default_engine: default_engine(),
            default_format: default_format(),
            default_output: default_output(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl OrchestratorConfig {
    /// Load config from a YAML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<OrchestratorConfig, OrchestratorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchestratorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| OrchestratorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save config to a YAML file.
    pub fn save(&self, path: &Path) -> Result<(), OrchestratorError> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| OrchestratorError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| {
            OrchestratorError::Config(format!("cannot write {}: {}", path.display(), e))
        })
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
