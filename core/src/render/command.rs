//! Structured Blender invocation builder.
//!
//! A `RenderCommand` holds the binary, scene, render settings, an environment
//! map, and a frame selection. Tokens are shell-quoted only at the final
//! rendering step, so paths with spaces survive intact. The orchestrator
//! specialises one template per chunk via `for_chunk`, which injects the
//! device-isolation environment and the frame-range flags — everything else
//! is fixed when the template is built.

use serde::{Deserialize, Serialize};

use crate::frames::Chunk;


/// Environment variable that restricts a render process to one device.
pub const PIN_ENV: &str = "CUDA_VISIBLE_DEVICES";


// ---------------------------------------------------------------------------
// FrameSelection
// ---------------------------------------------------------------------------

/// Which frames a render invocation covers. Blender's CLI distinguishes an
/// animation run (`-s/-e/-a`) from a single frame (`-f`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSelection {
    Range { start: i32, end: i32 },
    Single(i32),
}


// ---------------------------------------------------------------------------
// RenderCommand
// ---------------------------------------------------------------------------

/// One Blender invocation: argument tokens plus environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderCommand {
    /// Path to the Blender binary on the render host.
    pub binary: String,
    /// Path to the scene file on the render host.
    pub scene: String,
    /// Render engine (`-E`), e.g. "CYCLES".
    pub engine: String,
    /// Output path template (`-o`); Blender appends the frame number.
    pub output: String,
    /// Image format (`-F`), e.g. "PNG".
    pub format: String,
    /// Optional setup script run before rendering (`-P`). The pinned device
    /// index is passed to it after `--`.
    pub python_script: Option<String>,
    /// Environment entries prepended to the invocation.
    pub env: Vec<(String, String)>,
    /// Frame selection; `None` until a chunk is applied.
    pub frames: Option<FrameSelection>,
    /// Arguments passed through to the script after `--`.
    pub script_args: Vec<String>,
}

impl RenderCommand {
    /// New template with the usual defaults (CYCLES, PNG).
    pub fn new(binary: &str, scene: &str) -> Self {
        RenderCommand {
            binary: binary.to_string(),
            scene: scene.to_string(),
            engine: "CYCLES".to_string(),
            output: "//render_".to_string(),
            format: "PNG".to_string(),
            python_script: None,
            env: Vec::new(),
            frames: None,
            script_args: Vec::new(),
        }
    }

    /// Specialise this template for one chunk: pin the chunk's device via
    /// `CUDA_VISIBLE_DEVICES`, select its frames (single-frame chunks get the
    /// `-f` shape), and — when a setup script is present — pass the device
    /// index through to it. With `device_prefix`, the output template gains a
    /// `gpu<i>_` component so each device writes distinct filenames.
    pub fn for_chunk(&self, chunk: &Chunk, device_prefix: bool) -> RenderCommand {
        let mut cmd = self.clone();
        cmd.env
            .push((PIN_ENV.to_string(), chunk.device.index.to_string()));
        cmd.frames = Some(if chunk.range.is_single_frame() {
            FrameSelection::Single(chunk.range.start)
        } else {
            FrameSelection::Range {
                start: chunk.range.start,
                end: chunk.range.end,
            }
        });
        if device_prefix {
            if !cmd.output.ends_with('_') {
                cmd.output.push('_');
            }
            cmd.output.push_str(&format!("gpu{}_", chunk.device.index));
        }
        if cmd.python_script.is_some() {
            cmd.script_args.push(chunk.device.index.to_string());
        }
        cmd
    }

    /// The argument-token vector, in the order Blender requires: settings
    /// before the render action, script passthrough last.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-b".to_string(),
            self.scene.clone(),
            "-E".to_string(),
            self.engine.clone(),
        ];
        if let Some(ref script) = self.python_script {
            args.push("-P".to_string());
            args.push(script.clone());
        }
        args.push("-o".to_string());
        args.push(self.output.clone());
        args.push("-F".to_string());
        args.push(self.format.clone());
        args.push("-x".to_string());
        args.push("1".to_string());
        match self.frames {
            Some(FrameSelection::Range { start, end }) => {
                args.push("-s".to_string());
                args.push(start.to_string());
                args.push("-e".to_string());
                args.push(end.to_string());
                args.push("-a".to_string());
            }
            Some(FrameSelection::Single(frame)) => {
                args.push("-f".to_string());
                args.push(frame.to_string());
            }
            None => {}
        }
        if !self.script_args.is_empty() {
            args.push("--".to_string());
            args.extend(self.script_args.iter().cloned());
        }
        args
    }

    /// Render the invocation as a single shell command string:
    /// `ENV=val binary args...`, each token quoted as needed.
    pub fn shell_string(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        parts.push(shell_quote(&self.binary));
        parts.extend(self.args().iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}


// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Quote a token for `sh`. Safe tokens pass through untouched; anything else
/// is single-quoted with embedded quotes escaped.
pub fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ',')
        });
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', "'\\''"))
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
