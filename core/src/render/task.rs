//! Render task lifecycle and completion tracking.
//!
//! One `RenderTask` exists per chunk. Tasks move Pending → Running at spawn
//! and Running → Succeeded/Failed at process exit; terminal states are final
//! and nothing is retried automatically. `TaskSet` owns the tasks for one
//! orchestration run and aggregates the final `RenderReport` once every task
//! has reached a terminal state.

use serde::{Deserialize, Serialize};

use crate::frames::{Chunk, FrameRange};


// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a render task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not yet spawned.
    Pending,
    /// Process is running on the render host.
    Running,
    /// Process exited zero.
    Succeeded,
    /// Process exited nonzero, or could not be spawned.
    Failed,
}

impl TaskStatus {
    /// Whether this state is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}


// ---------------------------------------------------------------------------
// RenderTask
// ---------------------------------------------------------------------------

/// One render process and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderTask {
    /// Human-readable identity, e.g. "gpu1 [26-50]".
    pub label: String,
    /// Index of the pinned device.
    pub device_index: u32,
    /// The chunk's frame range.
    pub range: FrameRange,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Exit code, once the process has exited.
    pub exit_code: Option<i32>,
    /// Failure description (spawn error or poll failure).
    pub error: Option<String>,
    /// Epoch-millisecond timestamp when the process was spawned.
    pub started_ms: Option<u64>,
    /// Epoch-millisecond timestamp when the task reached a terminal state.
    pub completed_ms: Option<u64>,
}


// ---------------------------------------------------------------------------
// TaskSet
// ---------------------------------------------------------------------------

/// The tasks of one orchestration run, in chunk order. Task IDs are indices
/// into this set.
#[derive(Debug, Default)]
pub struct TaskSet {
    tasks: Vec<RenderTask>,
}

impl TaskSet {
    pub fn new() -> Self {
        TaskSet { tasks: Vec::new() }
    }

    /// Register a task for a chunk. Returns its ID.
    pub fn register(&mut self, chunk: &Chunk) -> usize {
        self.tasks.push(RenderTask {
            label: chunk.label(),
            device_index: chunk.device.index,
            range: chunk.range,
            status: TaskStatus::Pending,
            exit_code: None,
            error: None,
            started_ms: None,
            completed_ms: None,
        });
        self.tasks.len() - 1
    }

    /// Mark a task as spawned.
    pub fn mark_running(&mut self, id: usize, now_ms: u64) -> Result<(), String> {
        let task = self.task_mut(id)?;
        if task.status != TaskStatus::Pending {
            return Err(format!(
                "task {} is {:?}, cannot start",
                task.label, task.status
            ));
        }
        task.status = TaskStatus::Running;
        task.started_ms = Some(now_ms);
        Ok(())
    }

    /// Record a process exit. Zero is success, anything else failure.
    pub fn complete(&mut self, id: usize, exit_code: i32, now_ms: u64) -> Result<(), String> {
        let task = self.task_mut(id)?;
        if task.status.is_terminal() {
            return Err(format!("task {} already finished", task.label));
        }
        task.status = if exit_code == 0 {
            TaskStatus::Succeeded
        } else {
            TaskStatus::Failed
        };
        task.exit_code = Some(exit_code);
        task.completed_ms = Some(now_ms);
        Ok(())
    }

    /// Record a failure that is not a normal exit (spawn error, lost handle).
    /// Valid from any non-terminal state; siblings are unaffected.
    pub fn fail(&mut self, id: usize, reason: &str, now_ms: u64) -> Result<(), String> {
        let task = self.task_mut(id)?;
        if task.status.is_terminal() {
            return Err(format!("task {} already finished", task.label));
        }
        task.status = TaskStatus::Failed;
        task.error = Some(reason.to_string());
        task.completed_ms = Some(now_ms);
        Ok(())
    }

    /// Look up a task by ID.
    pub fn get(&self, id: usize) -> Option<&RenderTask> {
        self.tasks.get(id)
    }

    /// The label of a task, for error reporting.
    pub fn label(&self, id: usize) -> String {
        self.tasks
            .get(id)
            .map(|t| t.label.clone())
            .unwrap_or_else(|| format!("task-{}", id))
    }

    /// All tasks, in chunk order.
    pub fn tasks(&self) -> &[RenderTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether every task has reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_terminal())
    }

    /// Aggregate the final report. Meaningful once `all_terminal()`.
    pub fn report(&self) -> RenderReport {
        let failed_labels: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Failed)
            .map(|t| t.label.clone())
            .collect();
        RenderReport {
            succeeded: failed_labels.is_empty()
                && self.tasks.iter().all(|t| t.status == TaskStatus::Succeeded),
            tasks: self.tasks.clone(),
            failed_labels,
        }
    }

    fn task_mut(&mut self, id: usize) -> Result<&mut RenderTask, String> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| format!("task {} not registered", id))
    }
}


// ---------------------------------------------------------------------------
// RenderReport
// ---------------------------------------------------------------------------

/// Aggregate outcome of one orchestration run. Success requires every task
/// to have succeeded; partial output from failed runs is preserved on the
/// host, not rolled back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderReport {
    pub succeeded: bool,
    pub tasks: Vec<RenderTask>,
    pub failed_labels: Vec<String>,
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameRange;
    use crate::gpu::Device;

    fn chunk(index: u32, start: i32, end: i32) -> Chunk {
        Chunk {
            device: Device {
                index,
                name: format!("GPU {}", index),
            },
            range: FrameRange::new(start, end).unwrap(),
        }
    }

    // -- Lifecycle --

    #[test]
    fn register_starts_pending() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(0, 1, 25));
        let task = set.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.label, "gpu0 [1-25]");
        assert_eq!(task.device_index, 0);
    }

    #[test]
    fn full_success_lifecycle() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(0, 1, 25));
        set.mark_running(id, 1000).unwrap();
        assert_eq!(set.get(id).unwrap().status, TaskStatus::Running);
        set.complete(id, 0, 5000).unwrap();

        let task = set.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.exit_code, Some(0));
        assert_eq!(task.started_ms, Some(1000));
        assert_eq!(task.completed_ms, Some(5000));
    }

    #[test]
    fn nonzero_exit_is_failure() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(1, 26, 50));
        set.mark_running(id, 1000).unwrap();
        set.complete(id, 137, 2000).unwrap();
        let task = set.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.exit_code, Some(137));
    }

    #[test]
    fn spawn_failure_from_pending() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(0, 1, 10));
        set.fail(id, "ssh: connection refused", 1000).unwrap();
        let task = set.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("ssh: connection refused"));
        assert!(task.exit_code.is_none());
    }

    #[test]
    fn terminal_states_are_final() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(0, 1, 10));
        set.mark_running(id, 100).unwrap();
        set.complete(id, 0, 200).unwrap();
        assert!(set.complete(id, 1, 300).is_err());
        assert!(set.fail(id, "late", 300).is_err());
        assert_eq!(set.get(id).unwrap().status, TaskStatus::Succeeded);
    }

    #[test]
    fn cannot_start_twice() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(0, 1, 10));
        set.mark_running(id, 100).unwrap();
        assert!(set.mark_running(id, 200).is_err());
    }

    #[test]
    fn unknown_id_errors() {
        let mut set = TaskSet::new();
        assert!(set.mark_running(9, 0).is_err());
        assert!(set.complete(9, 0, 0).is_err());
        assert!(set.fail(9, "x", 0).is_err());
        assert!(set.get(9).is_none());
    }

    // -- all_terminal --

    #[test]
    fn all_terminal_tracks_progress() {
        let mut set = TaskSet::new();
        let a = set.register(&chunk(0, 1, 50));
        let b = set.register(&chunk(1, 51, 100));
        set.mark_running(a, 100).unwrap();
        set.mark_running(b, 100).unwrap();
        assert!(!set.all_terminal());
        set.complete(a, 0, 500).unwrap();
        assert!(!set.all_terminal());
        set.complete(b, 0, 600).unwrap();
        assert!(set.all_terminal());
    }

    // -- Aggregation --

    #[test]
    fn all_succeeded_aggregates_success() {
        let mut set = TaskSet::new();
        for i in 0..3 {
            let id = set.register(&chunk(i, (i as i32) * 10 + 1, (i as i32) * 10 + 10));
            set.mark_running(id, 100).unwrap();
            set.complete(id, 0, 200).unwrap();
        }
        let report = set.report();
        assert!(report.succeeded);
        assert!(report.failed_labels.is_empty());
        assert_eq!(report.tasks.len(), 3);
    }

    #[test]
    fn one_failure_fails_aggregate_without_false_negatives() {
        let mut set = TaskSet::new();
        let a = set.register(&chunk(0, 1, 50));
        let b = set.register(&chunk(1, 51, 100));
        set.mark_running(a, 100).unwrap();
        set.mark_running(b, 100).unwrap();
        set.complete(a, 0, 500).unwrap();
        set.complete(b, 1, 600).unwrap();

        let report = set.report();
        assert!(!report.succeeded);
        assert_eq!(report.failed_labels, vec!["gpu1 [51-100]"]);
        // The sibling that exited zero is still reported as succeeded.
        assert_eq!(report.tasks[0].status, TaskStatus::Succeeded);
        assert_eq!(report.tasks[1].status, TaskStatus::Failed);
    }

    #[test]
    fn report_serialises_to_json() {
        let mut set = TaskSet::new();
        let id = set.register(&chunk(0, 1, 10));
        set.mark_running(id, 100).unwrap();
        set.complete(id, 0, 200).unwrap();

        let json = serde_json::to_string(&set.report()).unwrap();
        assert!(json.contains("\"succeeded\":true"));
        assert!(json.contains("\"status\":\"succeeded\""));
        assert!(json.contains("gpu0 [1-10]"));
    }

    #[test]
    fn label_falls_back_for_unknown_ids() {
        let set = TaskSet::new();
        assert_eq!(set.label(4), "task-4");
    }
}
