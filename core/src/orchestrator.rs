//! Render orchestrator — wires the pure components to real execution.
//!
//! `RenderOrchestrator` is the integration layer that connects the host
//! registry, GPU enumeration, frame partitioner, command builder, task set,
//! and monitor to real command execution via the injected `CommandRunner`
//! and `ProcessLauncher`. It is the only component that causes side effects
//! (through the injected traits), and its control flow is single-threaded:
//! spawn every task, then poll them all in one join loop until the last has
//! exited.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::OrchestratorConfig;
use crate::errors::OrchestratorError;
use crate::frames::{self, FrameRange};
use crate::gpu::{self, Device};
use crate::infrastructure::runner::{ChildHandle, CommandRunner, ProcessLauncher};
use crate::monitor::progress::ProgressSnapshot;
use crate::monitor::stats::RenderStatistics;
use crate::monitor::timing::TimingParser;
use crate::remote::collect::CollectManager;
use crate::remote::config::{HostRegistry, RemoteConfig};
use crate::remote::connection::ConnectionTracker;
use crate::render::command::{shell_quote, RenderCommand};
use crate::render::task::{RenderReport, TaskSet};


// ---------------------------------------------------------------------------
// RenderJob
// ---------------------------------------------------------------------------

/// One render request. Optional fields fall back to the orchestrator config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    /// Scene file path on the render host, relative to its workspace.
    pub scene: String,
    /// Inclusive frame range to render.
    pub range: FrameRange,
    /// Render engine override.
    pub engine: Option<String>,
    /// Output path template override.
    pub output: Option<String>,
    /// Image format override.
    pub format: Option<String>,
    /// Setup script run before rendering; receives the device index.
    pub python_script: Option<String>,
    /// Give each device its own `gpu<i>_` output filename component.
    pub device_prefix: bool,
    /// Distribute across all discovered GPUs; off means one task on the
    /// first device.
    pub distribute: bool,
}

impl RenderJob {
    pub fn new(scene: &str, range: FrameRange) -> Self {
        RenderJob {
            scene: scene.to_string(),
            range,
            engine: None,
            output: None,
            format: None,
            python_script: None,
            device_prefix: false,
            distribute: true,
        }
    }
}


// ---------------------------------------------------------------------------
// RenderOrchestrator
// ---------------------------------------------------------------------------

/// Orchestrates one render cycle: probe, enumerate, partition, launch,
/// track, collect.
pub struct RenderOrchestrator {
    pub registry: HostRegistry,
    pub connections: ConnectionTracker,
    pub collector: CollectManager,
    config: OrchestratorConfig,
    runner: Box<dyn CommandRunner>,
    launcher: Box<dyn ProcessLauncher>,
}

impl fmt::Debug for RenderOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOrchestrator")
            .field("registry", &self.registry)
            .finish()
    }
}

impl RenderOrchestrator {
    /// Create a new orchestrator with the given registry, config, and
    /// execution backends.
    pub fn new(
        registry: HostRegistry,
        config: OrchestratorConfig,
        runner: Box<dyn CommandRunner>,
        launcher: Box<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            registry,
            connections: ConnectionTracker::new(),
            collector: CollectManager::new(1),
            config,
            runner,
            launcher,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Probe a host over SSH and record the outcome in the tracker.
    pub fn check_host(&mut self, name: Option<&str>) -> Result<String, OrchestratorError> {
        let host = self.resolve_host(name)?;
        self.connections.register(&host.name);

        let started = now_ms();
        let _ = self.connections.start_connecting(&host.name, started);

        let probe = format!("ssh {} echo ok", host.ssh_base_args().join(" "));
        match self.runner.run(&probe) {
            Ok(output) if output.trim() == "ok" => {
                let done = now_ms();
                let _ = self
                    .connections
                    .mark_connected(&host.name, done, done.saturating_sub(started));
                Ok(format!(
                    "Host '{}' reachable ({})",
                    host.name,
                    host.user_at_host()
                ))
            }
            Ok(output) => {
                let reason = format!("unexpected response: {}", output.trim());
                let _ = self.connections.mark_failed(&host.name, &reason, now_ms());
                Err(OrchestratorError::HostUnreachable {
                    host: host.name,
                    reason,
                })
            }
            Err(reason) => {
                let _ = self.connections.mark_failed(&host.name, &reason, now_ms());
                Err(OrchestratorError::HostUnreachable {
                    host: host.name,
                    reason,
                })
            }
        }
    }

    /// Enumerate the GPUs on a host.
    pub fn list_gpus(&mut self, name: Option<&str>) -> Result<Vec<Device>, OrchestratorError> {
        let host = self.resolve_host(name)?;
        gpu::list_devices(self.runner.as_ref(), &host)
    }

    /// Run a render job to completion and return the aggregate report.
    pub fn render(
        &mut self,
        name: Option<&str>,
        job: &RenderJob,
    ) -> Result<RenderReport, OrchestratorError> {
        self.render_with_observer(name, job, &mut |_| {})
    }

    /// Run a render job, invoking `observe` with fresh progress snapshots on
    /// every poll pass. The observer is a read-only projection; it cannot
    /// influence scheduling.
    pub fn render_with_observer(
        &mut self,
        name: Option<&str>,
        job: &RenderJob,
        observe: &mut dyn FnMut(&[ProgressSnapshot]),
    ) -> Result<RenderReport, OrchestratorError> {
        let host = self.resolve_host(name)?;

        // Enumerate once; the device list is static for the whole run.
        let devices = gpu::list_devices(self.runner.as_ref(), &host)?;
        if devices.is_empty() {
            return Err(OrchestratorError::NoDevices(host.name.clone()));
        }

        let device_count = if job.distribute { devices.len() } else { 1 };
        let chunks = frames::assign(frames::partition(job.range, device_count), &devices);

        let template = self.command_template(job);
        let mut tasks = TaskSet::new();
        let mut handles: Vec<Option<Box<dyn ChildHandle>>> = Vec::new();

        // Fire every task before joining any. A spawn failure is recorded
        // against its task and never aborts siblings.
        for chunk in &chunks {
            let id = tasks.register(chunk);
            let render_cmd = template.for_chunk(chunk, job.device_prefix);
            let remote_cmd = remote_shell_command(&host, &render_cmd);
            match self.launcher.launch(&remote_cmd) {
                Ok(handle) => {
                    tasks
                        .mark_running(id, now_ms())
                        .map_err(OrchestratorError::Config)?;
                    handles.push(Some(handle));
                }
                Err(reason) => {
                    let spawn_err = OrchestratorError::TaskSpawn {
                        label: tasks.label(id),
                        reason,
                    };
                    tasks
                        .fail(id, &spawn_err.to_string(), now_ms())
                        .map_err(OrchestratorError::Config)?;
                    handles.push(None);
                }
            }
        }

        // Join loop: drain output into the per-device parsers, poll for
        // exits, refresh the observer. Runs until the last task is terminal —
        // a failed sibling never cancels tasks still in flight.
        let mut parsers: Vec<TimingParser> =
            chunks.iter().map(|_| TimingParser::new()).collect();
        let mut stats: Vec<RenderStatistics> =
            chunks.iter().map(|_| RenderStatistics::new()).collect();

        loop {
            for (id, slot) in handles.iter_mut().enumerate() {
                let Some(handle) = slot.as_mut() else { continue };

                for line in handle.drain_lines() {
                    if let Some(timing) = parsers[id].feed(&line) {
                        stats[id].record(timing.frame, timing.seconds);
                    }
                }

                match handle.poll() {
                    Ok(Some(code)) => {
                        // Final drain: lines that arrived with the exit.
                        for line in handle.drain_lines() {
                            if let Some(timing) = parsers[id].feed(&line) {
                                stats[id].record(timing.frame, timing.seconds);
                            }
                        }
                        tasks
                            .complete(id, code, now_ms())
                            .map_err(OrchestratorError::Config)?;
                        *slot = None;
                    }
                    Ok(None) => {}
                    Err(reason) => {
                        tasks
                            .fail(id, &reason, now_ms())
                            .map_err(OrchestratorError::Config)?;
                        *slot = None;
                    }
                }
            }

            let snapshots: Vec<ProgressSnapshot> = tasks
                .tasks()
                .iter()
                .zip(stats.iter())
                .map(|(task, stat)| ProgressSnapshot::capture(task, stat))
                .collect();
            observe(&snapshots);

            if tasks.all_terminal() {
                break;
            }
            std::thread::sleep(Duration::from_millis(self.config.poll_interval_ms));
        }

        Ok(tasks.report())
    }

    /// Archive the host's output directory and fetch it into `local_dest`.
    pub fn collect(
        &mut self,
        name: Option<&str>,
        local_dest: &str,
    ) -> Result<String, OrchestratorError> {
        let host = self.resolve_host(name)?;
        let remote_dir = self.output_dir(&host);

        let job_id = self.collector.queue(&host.name, &remote_dir, local_dest);
        let job = self
            .collector
            .start_next(now_ms())
            .ok_or_else(|| OrchestratorError::Collect("failed to start collect job".into()))?
            .clone();

        let archive_cmd = format!(
            "ssh {} {}",
            host.ssh_base_args().join(" "),
            shell_quote(&self.collector.build_archive_command(&job))
        );
        if let Err(e) = self.runner.run(&archive_cmd) {
            self.collector
                .fail(&job_id, &e, now_ms())
                .map_err(OrchestratorError::Config)?;
            return Err(OrchestratorError::Collect(e));
        }

        let fetch_cmd = format!(
            "scp {}",
            self.collector.build_fetch_args(&job, &host).join(" ")
        );
        match self.runner.run(&fetch_cmd) {
            Ok(_) => {
                self.collector
                    .complete(&job_id, now_ms())
                    .map_err(OrchestratorError::Config)?;
                Ok(format!(
                    "Collected output from '{}' into {}",
                    host.name, local_dest
                ))
            }
            Err(e) => {
                self.collector
                    .fail(&job_id, &e, now_ms())
                    .map_err(OrchestratorError::Config)?;
                Err(OrchestratorError::Collect(e))
            }
        }
    }

    fn resolve_host(&self, name: Option<&str>) -> Result<RemoteConfig, OrchestratorError> {
        match name {
            Some(n) => self
                .registry
                .get(n)
                .cloned()
                .ok_or_else(|| OrchestratorError::HostNotFound(n.to_string())),
            None => {
                let default = self.registry.default_name().ok_or_else(|| {
                    OrchestratorError::Config("no host given and no default host set".into())
                })?;
                self.registry
                    .get(default)
                    .cloned()
                    .ok_or_else(|| OrchestratorError::HostNotFound(default.to_string()))
            }
        }
    }

    fn command_template(&self, job: &RenderJob) -> RenderCommand {
        let mut cmd = RenderCommand::new(&self.config.blender_binary, &job.scene);
        cmd.engine = job
            .engine
            .clone()
            .unwrap_or_else(|| self.config.default_engine.clone());
        cmd.format = job
            .format
            .clone()
            .unwrap_or_else(|| self.config.default_format.clone());
        cmd.output = job
            .output
            .clone()
            .unwrap_or_else(|| self.config.default_output.clone());
        cmd.python_script = job.python_script.clone();
        cmd
    }

    /// Directory on the host that render output lands in: the directory
    /// component of the output template, under the workspace.
    fn output_dir(&self, host: &RemoteConfig) -> String {
        let template = &self.config.default_output;
        let dir = match template.rfind('/') {
            Some(pos) => &template[..pos],
            None => "",
        };
        if dir.is_empty() {
            host.workspace_dir.trim_end_matches('/').to_string()
        } else if dir.starts_with('/') {
            dir.to_string()
        } else {
            format!("{}/{}", host.workspace_dir.trim_end_matches('/'), dir)
        }
    }
}

/// Wrap a render command for execution on the host: enter the workspace,
/// then run the pinned invocation. The whole thing is passed to ssh as one
/// quoted argument so the remote shell — not the local one — interprets it.
fn remote_shell_command(host: &RemoteConfig, cmd: &RenderCommand) -> String {
    let in_workspace = format!(
        "cd {} && {}",
        shell_quote(&host.workspace_dir),
        cmd.shell_string()
    );
    format!(
        "ssh {} {}",
        host.ssh_base_args().join(" "),
        shell_quote(&in_workspace)
    )
}

/// Wall-clock milliseconds.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
