//! Command — the typed interface for all brig operations.
//!
//! Every operation the CLI can dispatch is a variant of the `Command` enum.
//! Parsing from argv lives in `cli::parse`; dispatch lives in the binary.

/// Arguments for the `render` subcommand.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderArgs {
    /// Scene file path on the render host.
    pub scene: String,
    /// First frame, inclusive.
    pub start: i32,
    /// Last frame, inclusive.
    pub end: i32,
    /// Target host; default host when omitted.
    pub host: Option<String>,
    /// Output path template override.
    pub output: Option<String>,
    /// Render engine override.
    pub engine: Option<String>,
    /// Image format override.
    pub format: Option<String>,
    /// Setup script passed to Blender with the device index.
    pub script: Option<String>,
    /// Render on a single device instead of distributing.
    pub no_distribute: bool,
    /// Give each device its own output filename prefix.
    pub gpu_prefix: bool,
    /// Show the live TUI progress dashboard.
    pub watch: bool,
    /// Print the final report as JSON.
    pub json: bool,
}

/// A parsed CLI invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Probe a host over SSH.
    Check { host: Option<String> },

    /// List the GPUs visible on a host.
    Gpus { host: Option<String>, json: bool },

    /// Distribute a frame range across a host's GPUs and render it.
    Render(RenderArgs),

    /// Archive the host's output directory and fetch it.
    Collect { host: Option<String>, dest: String },

    /// List configured hosts, optionally filtered by label.
    Hosts { label: Option<String> },

    /// Show usage.
    Help,
}
