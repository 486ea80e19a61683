//! Brig CLI — the command-line entry point for Blendrig.
//!
//! # Usage
//!
//! ```text
//! brig check [--host r1]
//! brig gpus [--host r1] [--json]
//! brig render --scene cube.blend --start 1 --end 100 [--watch]
//! brig collect --dest ./results.tar.gz
//! brig hosts [--label a100]
//! ```

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use blendrig_core::cli::parse_args;
use blendrig_core::command::{Command, RenderArgs};
use blendrig_core::config::OrchestratorConfig;
use blendrig_core::frames::FrameRange;
use blendrig_core::gpu::Device;
use blendrig_core::infrastructure::runner::{ShellLauncher, ShellRunner};
use blendrig_core::monitor::progress::{render_line, ProgressSnapshot};
use blendrig_core::orchestrator::{RenderJob, RenderOrchestrator};
use blendrig_core::remote::config::HostRegistry;
use blendrig_core::render::task::RenderReport;

use brig_tui::app::ProgressApp;


const HELP: &str = "\
brig — remote multi-GPU Blender render orchestration

Usage:
  brig check [--host <name>]
      Probe a render host over SSH.
  brig gpus [--host <name>] [--json]
      List the GPUs visible on a host.
  brig render --scene <path> --start <n> --end <n> [options]
      Distribute the frame range across the host's GPUs and render.
      Options: --host <name>  --output <template>  --engine <engine>
               --format <format>  --script <path>  --no-distribute
               --gpu-prefix  --watch  --json
  brig collect --dest <path> [--host <name>]
      Archive the host's output directory and fetch it.
  brig hosts [--label <label>]
      List configured hosts.
  brig help

Hosts are configured in <config-dir>/hosts.yaml; orchestrator defaults in
<config-dir>/config.yaml. The config dir is $BRIG_CONFIG_DIR or
~/.config/blendrig.
";


fn main() {
    let args: Vec<String> = std::env::args().collect();
    let arg_refs: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();

    let cmd = match parse_args(&arg_refs) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("brig: {}", e);
            process::exit(1);
        }
    };

    if matches!(cmd, Command::Help) {
        print!("{}", HELP);
        return;
    }

    let config_dir = resolve_config_dir();
    let registry = match load_registry(&config_dir) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("brig: {}", e);
            process::exit(1);
        }
    };
    let config = match load_config(&config_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("brig: {}", e);
            process::exit(1);
        }
    };

    let orchestrator = RenderOrchestrator::new(
        registry,
        config,
        Box::new(ShellRunner),
        Box::new(ShellLauncher),
    );

    let code = dispatch(orchestrator, cmd);
    process::exit(code);
}


fn dispatch(mut orchestrator: RenderOrchestrator, cmd: Command) -> i32 {
    match cmd {
        Command::Check { host } => match orchestrator.check_host(host.as_deref()) {
            Ok(msg) => {
                println!("{}", msg);
                0
            }
            Err(e) => {
                eprintln!("brig: {}", e);
                1
            }
        },
        Command::Gpus { host, json } => match orchestrator.list_gpus(host.as_deref()) {
            Ok(devices) => {
                print_devices(&devices, json);
                0
            }
            Err(e) => {
                eprintln!("brig: {}", e);
                1
            }
        },
        Command::Render(args) => run_render(orchestrator, args),
        Command::Collect { host, dest } => match orchestrator.collect(host.as_deref(), &dest) {
            Ok(msg) => {
                println!("{}", msg);
                0
            }
            Err(e) => {
                eprintln!("brig: {}", e);
                1
            }
        },
        Command::Hosts { label } => {
            print_hosts(&orchestrator, label.as_deref());
            0
        }
        Command::Help => {
            print!("{}", HELP);
            0
        }
    }
}


// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

fn run_render(mut orchestrator: RenderOrchestrator, args: RenderArgs) -> i32 {
    let range = match FrameRange::new(args.start, args.end) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("brig: {}", e);
            return 1;
        }
    };

    let mut job = RenderJob::new(&args.scene, range);
    job.engine = args.engine;
    job.output = args.output;
    job.format = args.format;
    job.python_script = args.script;
    job.device_prefix = args.gpu_prefix;
    job.distribute = !args.no_distribute;
    let host = args.host;

    let result = if args.watch {
        render_with_dashboard(orchestrator, host, job)
    } else {
        let mut last_done = usize::MAX;
        orchestrator.render_with_observer(host.as_deref(), &job, &mut |snaps| {
            print_plain_progress(snaps, &mut last_done);
        })
    };

    match result {
        Ok(report) => print_report(&report, args.json),
        Err(e) => {
            eprintln!("brig: {}", e);
            1
        }
    }
}

/// Run the render on a worker thread while the TUI dashboard owns the
/// terminal. Quitting the dashboard early leaves the render running; we
/// still join it and report.
fn render_with_dashboard(
    mut orchestrator: RenderOrchestrator,
    host: Option<String>,
    job: RenderJob,
) -> Result<RenderReport, blendrig_core::errors::OrchestratorError> {
    let progress: Arc<Mutex<Vec<ProgressSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(AtomicBool::new(false));

    let thread_progress = Arc::clone(&progress);
    let thread_finished = Arc::clone(&finished);
    let worker = std::thread::spawn(move || {
        let result = orchestrator.render_with_observer(host.as_deref(), &job, &mut |snaps| {
            if let Ok(mut shared) = thread_progress.lock() {
                *shared = snaps.to_vec();
            }
        });
        thread_finished.store(true, Ordering::SeqCst);
        result
    });

    if let Err(e) = ProgressApp::new(progress, finished).run() {
        eprintln!("brig: dashboard error: {}", e);
    }

    match worker.join() {
        Ok(result) => result,
        Err(_) => Err(blendrig_core::errors::OrchestratorError::Config(
            "render thread panicked".into(),
        )),
    }
}

/// Reprint the per-device progress lines whenever another frame lands.
fn print_plain_progress(snaps: &[ProgressSnapshot], last_done: &mut usize) {
    let done: usize = snaps.iter().map(|s| s.done).sum();
    if done == *last_done {
        return;
    }
    *last_done = done;
    for snap in snaps {
        eprintln!("{}", render_line(snap));
    }
}


// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_devices(devices: &[Device], json: bool) {
    if json {
        match serde_json::to_string_pretty(devices) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("brig: {}", e),
        }
        return;
    }
    if devices.is_empty() {
        println!("no GPUs found");
        return;
    }
    for device in devices {
        println!("{:>3}  {}", device.index, device.name);
    }
}

fn print_hosts(orchestrator: &RenderOrchestrator, label: Option<&str>) {
    let hosts: Vec<_> = match label {
        Some(l) => orchestrator.registry.by_label(l),
        None => orchestrator.registry.list().iter().collect(),
    };
    if hosts.is_empty() {
        println!("(no hosts configured)");
        return;
    }
    let default = orchestrator.registry.default_name();
    for host in hosts {
        let marker = if Some(host.name.as_str()) == default {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<12} {}  {}",
            marker,
            host.name,
            host.user_at_host(),
            host.workspace_dir
        );
    }
}

fn print_report(report: &RenderReport, json: bool) -> i32 {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("brig: {}", e),
        }
    } else {
        for task in &report.tasks {
            let outcome = match (task.exit_code, &task.error) {
                (Some(0), _) => "succeeded".to_string(),
                (Some(code), _) => format!("failed (exit {})", code),
                (None, Some(err)) => format!("failed ({})", err),
                (None, None) => "failed".to_string(),
            };
            println!("{}  {}", task.label, outcome);
        }
        if report.succeeded {
            println!("render complete");
        } else {
            eprintln!(
                "brig: render failed on: {}",
                report.failed_labels.join(", ")
            );
        }
    }
    if report.succeeded {
        0
    } else {
        1
    }
}


// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BRIG_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("blendrig")
}

fn load_registry(config_dir: &Path) -> Result<HostRegistry, String> {
    let path = config_dir.join("hosts.yaml");
    if !path.exists() {
        return Ok(HostRegistry::new());
    }
    HostRegistry::load(&path).map_err(|e| e.to_string())
}

fn load_config(config_dir: &Path) -> Result<OrchestratorConfig, String> {
    let path = config_dir.join("config.yaml");
    if !path.exists() {
        return Ok(OrchestratorConfig::default());
    }
    OrchestratorConfig::load(&path).map_err(|e| e.to_string())
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_config_dir_default() {
        let old = std::env::var("BRIG_CONFIG_DIR").ok();
        std::env::remove_var("BRIG_CONFIG_DIR");
        let dir = resolve_config_dir();
        assert!(dir.to_string_lossy().contains(".config/blendrig"));
        if let Some(v) = old {
            std::env::set_var("BRIG_CONFIG_DIR", v);
        }
    }

    #[test]
    fn resolve_config_dir_from_env() {
        std::env::set_var("BRIG_CONFIG_DIR", "/tmp/test-brig-config");
        let dir = resolve_config_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-brig-config"));
        std::env::remove_var("BRIG_CONFIG_DIR");
    }

    #[test]
    fn missing_config_files_fall_back_to_defaults() {
        let dir = std::env::temp_dir().join("brig-cli-test-missing");
        let _ = std::fs::create_dir_all(&dir);
        let registry = load_registry(&dir).unwrap();
        assert!(registry.list().is_empty());
        let config = load_config(&dir).unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn report_exit_codes() {
        use blendrig_core::render::task::{RenderReport, RenderTask, TaskStatus};

        let ok = RenderReport {
            succeeded: true,
            tasks: vec![],
            failed_labels: vec![],
        };
        assert_eq!(print_report(&ok, true), 0);

        let failed = RenderReport {
            succeeded: false,
            tasks: vec![RenderTask {
                label: "gpu0 [1-10]".into(),
                device_index: 0,
                range: FrameRange::new(1, 10).unwrap(),
                status: TaskStatus::Failed,
                exit_code: Some(1),
                error: None,
                started_ms: None,
                completed_ms: None,
            }],
            failed_labels: vec!["gpu0 [1-10]".into()],
        };
        assert_eq!(print_report(&failed, true), 1);
    }
}
