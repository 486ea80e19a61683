//! Output collection — archiving rendered frames and fetching them back.
//!
//! `CollectManager` maintains a queue of collection jobs and tracks their
//! lifecycle. A job archives the remote output directory with `tar` and
//! fetches the archive with `scp`. Like the rest of the remote subsystem it
//! builds argument vectors but never spawns processes — the orchestrator
//! executes them and reports results back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::RemoteConfig;


// ---------------------------------------------------------------------------
// CollectStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a collection job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectStatus {
    /// Waiting to be started.
    Queued,
    /// Archive/fetch in progress.
    Running,
    /// Archive fetched successfully.
    Completed,
    /// Archive or fetch failed.
    Failed,
}


// ---------------------------------------------------------------------------
// CollectJob
// ---------------------------------------------------------------------------

/// A single output-collection operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectJob {
    /// Unique identifier for this job.
    pub id: String,
    /// Name of the render host.
    pub host: String,
    /// Directory on the host containing the rendered frames.
    pub remote_dir: String,
    /// Archive path created on the host.
    pub archive_path: String,
    /// Local destination path for the fetched archive.
    pub local_dest: String,
    /// Current lifecycle status.
    pub status: CollectStatus,
    /// Epoch-millisecond timestamp when the job started.
    pub started_ms: Option<u64>,
    /// Epoch-millisecond timestamp when the job finished.
    pub completed_ms: Option<u64>,
    /// Error message on failure.
    pub error: Option<String>,
}


// ---------------------------------------------------------------------------
// CollectManager
// ---------------------------------------------------------------------------

/// Manages queued and active collection jobs.
pub struct CollectManager {
    /// Completed and failed jobs (for history).
    history: Vec<CollectJob>,
    /// Jobs waiting to start.
    queue: Vec<CollectJob>,
    /// Jobs currently running, keyed by ID.
    active: HashMap<String, CollectJob>,
    /// Monotonic ID counter.
    next_id: u64,
    /// Maximum number of concurrent jobs.
    max_concurrent: usize,
}

impl CollectManager {
    /// Create a new manager with the given concurrency limit.
    pub fn new(max_concurrent: usize) -> Self {
        CollectManager {
            history: Vec::new(),
            queue: Vec::new(),
            active: HashMap::new(),
            next_id: 1,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Queue a collection of `remote_dir` on `host` into `local_dest`.
    /// Returns the job ID.
    pub fn queue(&mut self, host: &str, remote_dir: &str, local_dest: &str) -> String {
        let id = format!("collect-{}", self.next_id);
        self.next_id += 1;
        let archive_path = format!("{}.tar.gz", remote_dir.trim_end_matches('/'));
        let job = CollectJob {
            id: id.clone(),
            host: host.to_string(),
            remote_dir: remote_dir.to_string(),
            archive_path,
            local_dest: local_dest.to_string(),
            status: CollectStatus::Queued,
            started_ms: None,
            completed_ms: None,
            error: None,
        };
        self.queue.push(job);
        id
    }

    /// Start the next queued job if under the concurrency limit. Returns the
    /// started job.
    pub fn start_next(&mut self, now_ms: u64) -> Option<&CollectJob> {
        if self.active.len() >= self.max_concurrent || self.queue.is_empty() {
            return None;
        }
        let mut job = self.queue.remove(0);
        job.status = CollectStatus::Running;
        job.started_ms = Some(now_ms);
        let id = job.id.clone();
        self.active.insert(id.clone(), job);
        self.active.get(&id)
    }

    /// Record that a job completed.
    pub fn complete(&mut self, job_id: &str, now_ms: u64) -> Result<(), String> {
        let mut job = self
            .active
            .remove(job_id)
            .ok_or_else(|| format!("no active collect job '{}'", job_id))?;
        job.status = CollectStatus::Completed;
        job.completed_ms = Some(now_ms);
        self.history.push(job);
        Ok(())
    }

    /// Record that a job failed.
    pub fn fail(&mut self, job_id: &str, error: &str, now_ms: u64) -> Result<(), String> {
        let mut job = self
            .active
            .remove(job_id)
            .ok_or_else(|| format!("no active collect job '{}'", job_id))?;
        job.status = CollectStatus::Failed;
        job.completed_ms = Some(now_ms);
        job.error = Some(error.to_string());
        self.history.push(job);
        Ok(())
    }

    /// Look up a job by ID across queue, active, and history.
    pub fn get(&self, job_id: &str) -> Option<&CollectJob> {
        self.active
            .get(job_id)
            .or_else(|| self.queue.iter().find(|j| j.id == job_id))
            .or_else(|| self.history.iter().find(|j| j.id == job_id))
    }

    /// Number of queued jobs.
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of active jobs.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// All completed/failed jobs.
    pub fn history(&self) -> &[CollectJob] {
        &self.history
    }

    /// Build the archive command to run on the host. Archives the contents
    /// of the output directory, not the directory itself, so extraction
    /// yields the frames directly.
    pub fn build_archive_command(&self, job: &CollectJob) -> String {
        format!(
            "tar czf {} -C {} .",
            job.archive_path, job.remote_dir
        )
    }

    /// Build the scp argument vector that fetches the archive. The resulting
    /// `Vec<String>` can be passed to `std::process::Command` with `"scp"`
    /// as the program.
    pub fn build_fetch_args(&self, job: &CollectJob, config: &RemoteConfig) -> Vec<String> {
        let mut args = config.scp_base_args();
        args.push(format!("{}:{}", config.user_at_host(), job.archive_path));
        args.push(job.local_dest.clone());
        args
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RemoteConfig {
        RemoteConfig {
            name: "r1".to_string(),
            host: "10.0.0.1".to_string(),
            port: 22,
            user: "ubuntu".to_string(),
            ssh_key: None,
            workspace_dir: "/home/ubuntu/work".to_string(),
            labels: Vec::new(),
        }
    }

    // -- Queue --

    #[test]
    fn queue_returns_unique_ids() {
        let mut mgr = CollectManager::new(1);
        let id1 = mgr.queue("r1", "/work/output", "./results");
        let id2 = mgr.queue("r1", "/work/output", "./results");
        assert_ne!(id1, id2);
        assert_eq!(mgr.queued_count(), 2);
    }

    #[test]
    fn queue_derives_archive_path() {
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output/", "./results");
        let job = mgr.get(&id).unwrap();
        assert_eq!(job.archive_path, "/work/output.tar.gz");
    }

    // -- Start --

    #[test]
    fn start_next_moves_to_active() {
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output", "./results");
        let job = mgr.start_next(1000).unwrap();
        assert_eq!(job.status, CollectStatus::Running);
        assert_eq!(job.started_ms, Some(1000));
        assert_eq!(mgr.queued_count(), 0);
        assert_eq!(mgr.active_count(), 1);
        assert!(mgr.get(&id).is_some());
    }

    #[test]
    fn start_next_respects_limit() {
        let mut mgr = CollectManager::new(1);
        mgr.queue("r1", "/a", "./x");
        mgr.queue("r1", "/b", "./y");
        assert!(mgr.start_next(100).is_some());
        assert!(mgr.start_next(100).is_none());
        assert_eq!(mgr.queued_count(), 1);
    }

    #[test]
    fn start_next_empty_queue() {
        let mut mgr = CollectManager::new(1);
        assert!(mgr.start_next(0).is_none());
    }

    // -- Complete / fail --

    #[test]
    fn complete_records() {
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output", "./results");
        mgr.start_next(1000);
        mgr.complete(&id, 2000).unwrap();

        let job = mgr.get(&id).unwrap();
        assert_eq!(job.status, CollectStatus::Completed);
        assert_eq!(job.completed_ms, Some(2000));
        assert_eq!(mgr.active_count(), 0);
        assert_eq!(mgr.history().len(), 1);
    }

    #[test]
    fn fail_records_error() {
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output", "./results");
        mgr.start_next(1000);
        mgr.fail(&id, "scp: connection lost", 1500).unwrap();

        let job = mgr.get(&id).unwrap();
        assert_eq!(job.status, CollectStatus::Failed);
        assert_eq!(job.error, Some("scp: connection lost".to_string()));
    }

    #[test]
    fn complete_missing_fails() {
        let mut mgr = CollectManager::new(1);
        assert!(mgr.complete("nope", 0).is_err());
        assert!(mgr.fail("nope", "x", 0).is_err());
    }

    // -- Command building --

    #[test]
    fn archive_command_shape() {
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output", "./results");
        let job = mgr.get(&id).unwrap().clone();
        let cmd = mgr.build_archive_command(&job);
        assert_eq!(cmd, "tar czf /work/output.tar.gz -C /work/output .");
    }

    #[test]
    fn fetch_args_shape() {
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output", "./results");
        let job = mgr.get(&id).unwrap().clone();
        let args = mgr.build_fetch_args(&job, &test_config());
        assert!(args.contains(&"-P".to_string()));
        assert!(args.contains(&"ubuntu@10.0.0.1:/work/output.tar.gz".to_string()));
        assert_eq!(args.last().unwrap(), "./results");
    }

    #[test]
    fn fetch_args_with_key() {
        let mut cfg = test_config();
        cfg.ssh_key = Some("/keys/id_rsa".to_string());
        let mut mgr = CollectManager::new(1);
        let id = mgr.queue("r1", "/work/output", "./results");
        let job = mgr.get(&id).unwrap().clone();
        let args = mgr.build_fetch_args(&job, &cfg);
        assert!(args.contains(&"-i".to_string()));
        assert!(args.contains(&"/keys/id_rsa".to_string()));
    }
}
