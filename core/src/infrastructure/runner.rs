//! Command runner and process launcher abstractions.
//!
//! `CommandRunner` executes a shell command string to completion and returns
//! its captured stdout. `ProcessLauncher` starts a command as a concurrent
//! child and hands back a `ChildHandle` that can be polled for exit and
//! drained for output lines — the shape the render fan-out needs (spawn all,
//! then join). `ShellRunner`/`ShellLauncher` are the production
//! implementations (`sh -c`); the mock variants record calls and replay
//! scripted results.

use std::cell::RefCell;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};


// ---------------------------------------------------------------------------
// CommandRunner
// ---------------------------------------------------------------------------

/// Trait for executing shell command strings to completion.
pub trait CommandRunner: Send {
    fn run(&self, cmd: &str) -> Result<String, String>;
}

/// Production runner that spawns `sh -c <cmd>` and waits for it.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str) -> Result<String, String> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .output()
            .map_err(|e| format!("Failed to execute: {}", e))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).to_string())
        }
    }
}


// ---------------------------------------------------------------------------
// ChildHandle / ProcessLauncher
// ---------------------------------------------------------------------------

/// A running child process.
///
/// Output lines accumulate in an internal buffer (stdout and stderr
/// combined) and are handed out by `drain_lines`; each line is returned
/// exactly once.
pub trait ChildHandle: Send + std::fmt::Debug {
    /// Check for exit without blocking. `Some(code)` once the process has
    /// exited; polling again after that is an error.
    fn poll(&mut self) -> Result<Option<i32>, String>;

    /// Block until the process exits and return its exit code.
    fn wait(&mut self) -> Result<i32, String>;

    /// Drain output lines captured since the previous call.
    fn drain_lines(&mut self) -> Vec<String>;
}

/// Trait for starting concurrent child processes.
pub trait ProcessLauncher: Send {
    fn launch(&self, cmd: &str) -> Result<Box<dyn ChildHandle>, String>;
}


// ---------------------------------------------------------------------------
// ShellLauncher
// ---------------------------------------------------------------------------

/// Production launcher that spawns `sh -c <cmd>` with piped output.
///
/// One reader thread per stream pushes lines into a shared buffer, so the
/// child never blocks on a full pipe and the caller can drain incrementally.
pub struct ShellLauncher;

impl ProcessLauncher for ShellLauncher {
    fn launch(&self, cmd: &str) -> Result<Box<dyn ChildHandle>, String> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to spawn: {}", e))?;

        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, Arc::clone(&lines));
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, Arc::clone(&lines));
        }

        Ok(Box::new(ShellChild { child, lines }))
    }
}

fn spawn_reader<R: std::io::Read + Send + 'static>(pipe: R, sink: Arc<Mutex<Vec<String>>>) {
    std::thread::spawn(move || {
        let reader = BufReader::new(pipe);
        for line in reader.lines() {
            match line {
                Ok(text) => {
                    if let Ok(mut buf) = sink.lock() {
                        buf.push(text);
                    }
                }
                Err(_) => break,
            }
        }
    });
}

#[derive(Debug)]
struct ShellChild {
    child: std::process::Child,
    lines: Arc<Mutex<Vec<String>>>,
}

impl ChildHandle for ShellChild {
    fn poll(&mut self) -> Result<Option<i32>, String> {
        match self.child.try_wait() {
            // A status without a code means the process died to a signal.
            Ok(Some(status)) => Ok(Some(status.code().unwrap_or(-1))),
            Ok(None) => Ok(None),
            Err(e) => Err(format!("wait failed: {}", e)),
        }
    }

    fn wait(&mut self) -> Result<i32, String> {
        let status = self
            .child
            .wait()
            .map_err(|e| format!("wait failed: {}", e))?;
        Ok(status.code().unwrap_or(-1))
    }

    fn drain_lines(&mut self) -> Vec<String> {
        match self.lines.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(_) => Vec::new(),
        }
    }
}


// ---------------------------------------------------------------------------
// MockRunner
// ---------------------------------------------------------------------------

/// Test-double runner that records commands and returns pre-configured
/// responses. The command log is shared, so a test can keep a handle on it
/// after the runner moves into an orchestrator.
pub struct MockRunner {
    responses: RefCell<Vec<Result<String, String>>>,
    commands: Arc<Mutex<Vec<String>>>,
}

unsafe impl Send for MockRunner {}

impl MockRunner {
    pub fn with_responses(responses: Vec<Result<String, String>>) -> Self {
        let mut reversed = responses;
        reversed.reverse();
        MockRunner {
            responses: RefCell::new(reversed),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn new() -> Self {
        MockRunner {
            responses: RefCell::new(Vec::new()),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn executed_commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Shared handle on the command log.
    pub fn commands_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.commands)
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &str) -> Result<String, String> {
        self.commands.lock().unwrap().push(cmd.to_string());
        let mut responses = self.responses.borrow_mut();
        if let Some(response) = responses.pop() {
            response
        } else {
            Ok(String::new())
        }
    }
}


// ---------------------------------------------------------------------------
// MockLauncher
// ---------------------------------------------------------------------------

/// Script for one mocked child: its output lines, exit code, and how many
/// polls return "still running" before the exit is reported. `Err` scripts a
/// spawn failure.
#[derive(Debug, Clone)]
pub struct MockChildScript {
    pub lines: Vec<String>,
    pub exit_code: i32,
    pub polls_before_exit: u32,
}

impl MockChildScript {
    pub fn exiting(exit_code: i32) -> Self {
        MockChildScript {
            lines: Vec::new(),
            exit_code,
            polls_before_exit: 0,
        }
    }

    pub fn with_lines(exit_code: i32, lines: Vec<String>) -> Self {
        MockChildScript {
            lines,
            exit_code,
            polls_before_exit: 0,
        }
    }
}

/// Test-double launcher. Records every launched command and an event log
/// (`launch`/`poll`/`wait` entries) so tests can assert that every task is
/// spawned before any is awaited.
pub struct MockLauncher {
    scripts: RefCell<Vec<Result<MockChildScript, String>>>,
    launched: Arc<Mutex<Vec<String>>>,
    events: Arc<Mutex<Vec<String>>>,
}

unsafe impl Send for MockLauncher {}

impl MockLauncher {
    pub fn with_scripts(scripts: Vec<Result<MockChildScript, String>>) -> Self {
        let mut reversed = scripts;
        reversed.reverse();
        MockLauncher {
            scripts: RefCell::new(reversed),
            launched: Arc::new(Mutex::new(Vec::new())),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn launched_commands(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    /// Shared handle on the launched-command log.
    pub fn launched_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.launched)
    }

    /// The interleaved launch/poll/wait event log.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Shared handle on the event log.
    pub fn events_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.events)
    }
}

impl ProcessLauncher for MockLauncher {
    fn launch(&self, cmd: &str) -> Result<Box<dyn ChildHandle>, String> {
        let index = {
            let mut launched = self.launched.lock().unwrap();
            launched.push(cmd.to_string());
            launched.len() - 1
        };
        self.events
            .lock()
            .unwrap()
            .push(format!("launch:{}", index));
        let script = self
            .scripts
            .borrow_mut()
            .pop()
            .unwrap_or(Ok(MockChildScript::exiting(0)))?;
        Ok(Box::new(MockChild {
            index,
            lines: script.lines,
            exit_code: script.exit_code,
            polls_remaining: script.polls_before_exit,
            events: Arc::clone(&self.events),
        }))
    }
}

#[derive(Debug)]
struct MockChild {
    index: usize,
    lines: Vec<String>,
    exit_code: i32,
    polls_remaining: u32,
    events: Arc<Mutex<Vec<String>>>,
}

impl ChildHandle for MockChild {
    fn poll(&mut self) -> Result<Option<i32>, String> {
        self.events.lock().unwrap().push(format!("poll:{}", self.index));
        if self.polls_remaining > 0 {
            self.polls_remaining -= 1;
            return Ok(None);
        }
        Ok(Some(self.exit_code))
    }

    fn wait(&mut self) -> Result<i32, String> {
        self.events.lock().unwrap().push(format!("wait:{}", self.index));
        Ok(self.exit_code)
    }

    fn drain_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- MockRunner --

    #[test]
    fn mock_runner_records_commands() {
        let runner = MockRunner::with_responses(vec![Ok("ok".into()), Ok("ok2".into())]);
        assert!(runner.run("echo hello").is_ok());
        assert!(runner.run("echo world").is_ok());
        let cmds = runner.executed_commands();
        assert_eq!(cmds, vec!["echo hello", "echo world"]);
    }

    #[test]
    fn mock_runner_returns_responses_in_order() {
        let runner = MockRunner::with_responses(vec![
            Ok("first".into()),
            Err("fail".into()),
            Ok("third".into()),
        ]);
        assert_eq!(runner.run("cmd1").unwrap(), "first");
        assert_eq!(runner.run("cmd2").unwrap_err(), "fail");
        assert_eq!(runner.run("cmd3").unwrap(), "third");
    }

    #[test]
    fn mock_runner_defaults_to_empty_ok() {
        let runner = MockRunner::new();
        assert_eq!(runner.run("anything").unwrap(), "");
    }

    // -- MockLauncher --

    #[test]
    fn mock_launcher_records_commands() {
        let launcher = MockLauncher::with_scripts(vec![
            Ok(MockChildScript::exiting(0)),
            Ok(MockChildScript::exiting(1)),
        ]);
        launcher.launch("render a").unwrap();
        launcher.launch("render b").unwrap();
        assert_eq!(launcher.launched_commands(), vec!["render a", "render b"]);
    }

    #[test]
    fn mock_child_reports_exit_code() {
        let launcher = MockLauncher::with_scripts(vec![Ok(MockChildScript::exiting(7))]);
        let mut child = launcher.launch("cmd").unwrap();
        assert_eq!(child.poll().unwrap(), Some(7));
    }

    #[test]
    fn mock_child_polls_before_exit() {
        let launcher = MockLauncher::with_scripts(vec![Ok(MockChildScript {
            lines: Vec::new(),
            exit_code: 0,
            polls_before_exit: 2,
        })]);
        let mut child = launcher.launch("cmd").unwrap();
        assert_eq!(child.poll().unwrap(), None);
        assert_eq!(child.poll().unwrap(), None);
        assert_eq!(child.poll().unwrap(), Some(0));
    }

    #[test]
    fn mock_child_drains_lines_once() {
        let launcher = MockLauncher::with_scripts(vec![Ok(MockChildScript::with_lines(
            0,
            vec!["line one".into(), "line two".into()],
        ))]);
        let mut child = launcher.launch("cmd").unwrap();
        assert_eq!(child.drain_lines(), vec!["line one", "line two"]);
        assert!(child.drain_lines().is_empty());
    }

    #[test]
    fn mock_launcher_scripts_spawn_failure() {
        let launcher =
            MockLauncher::with_scripts(vec![Err("ssh: connection refused".into())]);
        let err = launcher.launch("cmd").unwrap_err();
        assert!(err.contains("refused"));
        // The failed launch is still recorded.
        assert_eq!(launcher.launched_commands().len(), 1);
    }

    #[test]
    fn event_log_interleaves_launch_and_poll() {
        let launcher = MockLauncher::with_scripts(vec![
            Ok(MockChildScript::exiting(0)),
            Ok(MockChildScript::exiting(0)),
        ]);
        let mut a = launcher.launch("a").unwrap();
        let mut b = launcher.launch("b").unwrap();
        a.poll().unwrap();
        b.poll().unwrap();
        assert_eq!(
            launcher.events(),
            vec!["launch:0", "launch:1", "poll:0", "poll:1"]
        );
    }

    // -- ShellRunner / ShellLauncher --

    #[test]
    fn shell_runner_captures_stdout() {
        let runner = ShellRunner;
        let out = runner.run("echo shell-runner-ok").unwrap();
        assert_eq!(out.trim(), "shell-runner-ok");
    }

    #[test]
    fn shell_runner_failure_captures_stderr() {
        let runner = ShellRunner;
        let err = runner.run("echo oops >&2; exit 3").unwrap_err();
        assert!(err.contains("oops"));
    }

    #[test]
    fn shell_launcher_runs_to_completion() {
        let launcher = ShellLauncher;
        let mut child = launcher.launch("printf 'a\\nb\\n'").unwrap();
        let code = child.wait().unwrap();
        assert_eq!(code, 0);
        // Give the reader threads a moment to flush the pipe.
        std::thread::sleep(std::time::Duration::from_millis(50));
        let lines = child.drain_lines();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn shell_launcher_nonzero_exit() {
        let launcher = ShellLauncher;
        let mut child = launcher.launch("exit 5").unwrap();
        assert_eq!(child.wait().unwrap(), 5);
    }

    #[test]
    fn shell_launcher_captures_stderr_lines() {
        let launcher = ShellLauncher;
        let mut child = launcher.launch("echo warn >&2").unwrap();
        child.wait().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(child.drain_lines(), vec!["warn"]);
    }
}
