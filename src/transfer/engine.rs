//! Directional transfer of diff entries.
//!
//! `save` uploads what is local-only, local-newer or diverged; `load`
//! downloads what is remote-only, remote-newer or diverged. Nothing is ever
//! deleted. Jobs are drained from a shared queue by a fixed number of worker
//! tasks, each keeping its own report until the engine merges them.

use crate::namespace::{join_remote, Namespace, ProjectRef};
use crate::reconcile::DiffEntry;
use crate::store::{LocalFs, RemoteStore};
use crate::transfer::cancel::CancelFlag;
use crate::transfer::report::{PlannedTransfer, TransferPlan, TransferReport};
use crate::transfer::retry::{RetryFailure, RetryPolicy};
use crate::tree::path::parent_key;
use crate::types::Direction;
use parking_lot::Mutex;
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Both ends of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub local_dir: PathBuf,
    pub remote_dir: String,
    /// Remote directories above `remote_dir` that must exist, shallowest first.
    pub remote_parents: Vec<String>,
}

impl TransferTarget {
    pub fn for_project(namespace: &Namespace, project: &ProjectRef) -> Self {
        Self {
            local_dir: namespace.project_local(project),
            remote_dir: namespace.project_remote(project),
            remote_parents: vec![namespace.category_remote(&project.category)],
        }
    }

    pub fn local_path(&self, relative: &str) -> PathBuf {
        let mut path = self.local_dir.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    pub fn remote_path(&self, relative: &str) -> String {
        join_remote(&self.remote_dir, relative)
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Worker tasks per scope.
    pub workers: usize,
    pub retry: RetryPolicy,
    /// Deadline for each individual store call.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct Job {
    path: String,
    local_path: PathBuf,
    remote_path: String,
}

/// Executes transfer plans against the remote store and the local filesystem.
#[derive(Clone)]
pub struct TransferEngine {
    remote: Arc<dyn RemoteStore>,
    local: LocalFs,
    config: EngineConfig,
    cancel: CancelFlag,
}

impl TransferEngine {
    pub fn new(remote: Arc<dyn RemoteStore>, config: EngineConfig) -> Self {
        Self {
            remote,
            local: LocalFs::new(),
            config,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Select the entries `direction` would transfer. Touches no store.
    pub fn plan(&self, entries: &[DiffEntry], direction: Direction, target: &TransferTarget) -> TransferPlan {
        let (selected, skipped) = select(entries, direction);
        let transfers = selected
            .iter()
            .map(|entry| {
                let source = match direction {
                    Direction::Save => entry.local.as_ref(),
                    Direction::Load => entry.remote.as_ref(),
                };
                PlannedTransfer {
                    path: entry.path.clone(),
                    classification: entry.classification,
                    bytes: source.map(|e| e.size).unwrap_or(0),
                }
            })
            .collect();

        let directories = match direction {
            Direction::Save if !selected.is_empty() => remote_directories(entries, &selected, target),
            _ => Vec::new(),
        };

        TransferPlan {
            direction,
            transfers,
            directories,
            skipped,
        }
    }

    /// Execute the transfers `direction` calls for.
    ///
    /// Per-file failures never abort the batch; they are retried per the
    /// policy and then recorded in the report.
    #[instrument(skip(self, entries, direction, target), fields(scope = %target.remote_dir, direction = %direction))]
    pub async fn apply(&self, entries: &[DiffEntry], direction: Direction, target: &TransferTarget) -> TransferReport {
        let (selected, skipped) = select(entries, direction);
        let mut report = TransferReport {
            skipped,
            ..TransferReport::default()
        };
        if selected.is_empty() {
            return report;
        }

        let directories = match direction {
            Direction::Save => remote_directories(entries, &selected, target),
            Direction::Load => Vec::new(),
        };
        let failed_dirs = self.create_directories(&directories).await;

        let mut jobs = VecDeque::with_capacity(selected.len());
        for entry in selected {
            let remote_path = target.remote_path(entry.remote_path());
            if let Some((dir, reason)) = failed_dirs
                .iter()
                .find(|(dir, _)| remote_path.starts_with(&format!("{}/", dir)))
            {
                report.record_failure(
                    entry.path.clone(),
                    0,
                    format!("remote directory {} could not be created: {}", dir, reason),
                );
                continue;
            }
            jobs.push_back(Job {
                local_path: target.local_path(entry.local_path()),
                remote_path,
                path: entry.path.clone(),
            });
        }

        let worker_count = self.config.workers.max(1).min(jobs.len().max(1));
        let queue = Arc::new(Mutex::new(jobs));
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let engine = self.clone();
            let queue = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                engine.run_worker(worker_id, queue, direction).await
            }));
        }

        for handle in handles {
            match handle.await {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => error!(error = %e, "Transfer worker terminated abnormally"),
            }
        }

        let leftover = queue.lock().len();
        report.cancelled += leftover;
        report.sort_failures();
        report
    }

    /// Create remote directories in order; returns the ones that failed with their reason.
    async fn create_directories(&self, directories: &[String]) -> Vec<(String, String)> {
        let mut failed: Vec<(String, String)> = Vec::new();
        for dir in directories {
            if self.cancel.is_cancelled() {
                break;
            }
            if failed
                .iter()
                .any(|(f, _)| dir.starts_with(&format!("{}/", f)))
            {
                continue;
            }
            let result = self
                .config
                .retry
                .run(dir, self.config.request_timeout, &self.cancel, || self.remote.create_dir(dir))
                .await;
            match result {
                Ok(()) => debug!(directory = %dir, "Remote directory ready"),
                Err(failure) if failure.cancelled => break,
                Err(failure) => {
                    error!(
                        directory = %dir,
                        attempts = failure.attempts,
                        error = %failure.error,
                        "Failed to create remote directory"
                    );
                    failed.push((dir.clone(), failure.error.to_string()));
                }
            }
        }
        failed
    }

    async fn run_worker(
        &self,
        worker_id: usize,
        queue: Arc<Mutex<VecDeque<Job>>>,
        direction: Direction,
    ) -> TransferReport {
        let mut report = TransferReport::default();
        loop {
            if self.cancel.is_cancelled() {
                debug!(worker_id, "Cancellation requested, worker stopping");
                break;
            }
            let job = queue.lock().pop_front();
            let Some(job) = job else {
                break;
            };

            let result = match direction {
                Direction::Save => self.upload(&job).await,
                Direction::Load => self.download(&job).await,
            };
            match result {
                Ok(()) => {
                    debug!(worker_id, path = %job.path, %direction, "Transferred");
                    report.record_success(direction);
                }
                Err(failure) if failure.cancelled => {
                    debug!(worker_id, path = %job.path, attempts = failure.attempts, "Cancelled between attempts");
                    report.cancelled += 1;
                }
                Err(failure) => {
                    error!(
                        worker_id,
                        path = %job.path,
                        attempts = failure.attempts,
                        error = %failure.error,
                        "Transfer failed"
                    );
                    report.record_failure(job.path, failure.attempts, failure.error.to_string());
                }
            }
        }
        report
    }

    async fn upload(&self, job: &Job) -> Result<(), RetryFailure> {
        self.config
            .retry
            .run(&job.path, self.config.request_timeout, &self.cancel, || {
                self.remote.upload(&job.local_path, &job.remote_path)
            })
            .await
    }

    /// Download into a sibling staging file, then rename over the target.
    async fn download(&self, job: &Job) -> Result<(), RetryFailure> {
        let staging = self
            .local
            .prepare_download(&job.local_path)
            .map_err(RetryFailure::single)?;

        let result = self
            .config
            .retry
            .run(&job.path, self.config.request_timeout, &self.cancel, || {
                self.remote.download(&job.remote_path, &staging)
            })
            .await;

        match result {
            Ok(()) => self.local.commit(&staging, &job.local_path).map_err(|error| {
                self.local.discard(&staging);
                RetryFailure::single(error)
            }),
            Err(failure) => {
                self.local.discard(&staging);
                Err(failure)
            }
        }
    }
}

/// Entries `direction` transfers, plus the count of those it leaves alone.
fn select(entries: &[DiffEntry], direction: Direction) -> (Vec<&DiffEntry>, usize) {
    let selected: Vec<&DiffEntry> = entries
        .iter()
        .filter(|entry| entry.classification.needs_transfer(direction))
        .collect();
    let skipped = entries.len() - selected.len();
    (selected, skipped)
}

/// Remote directories that must exist before uploading `selected`.
///
/// Paths use each entry's remote spelling. Directories already implied by
/// remote entries are left out. When the remote side of the scope has no
/// entries at all, the scope directory and its parents are included.
fn remote_directories(entries: &[DiffEntry], selected: &[&DiffEntry], target: &TransferTarget) -> Vec<String> {
    let mut existing = BTreeSet::new();
    let mut remote_has_entries = false;
    for entry in entries.iter().filter(|e| e.remote.is_some()) {
        remote_has_entries = true;
        let mut current = parent_key(entry.remote_path());
        while let Some(dir) = current {
            if !existing.insert(dir) {
                break;
            }
            current = parent_key(dir);
        }
    }

    let mut needed = BTreeSet::new();
    for entry in selected {
        let mut current = parent_key(entry.remote_path());
        while let Some(dir) = current {
            if existing.contains(dir) || !needed.insert(dir) {
                break;
            }
            current = parent_key(dir);
        }
    }

    let mut relative: Vec<&str> = needed.into_iter().collect();
    relative.sort_by(|a, b| {
        let depth_a = a.matches('/').count();
        let depth_b = b.matches('/').count();
        depth_a.cmp(&depth_b).then_with(|| a.cmp(b))
    });

    let mut directories = Vec::new();
    if !remote_has_entries {
        directories.extend(target.remote_parents.iter().cloned());
        directories.push(target.remote_dir.clone());
    }
    directories.extend(relative.into_iter().map(|dir| target.remote_path(dir)));
    directories
}
