//! Transfer outcomes and dry-run plans.

use crate::reconcile::Classification;
use crate::types::Direction;
use serde::Serialize;

/// A transfer that exhausted its attempts or failed permanently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTransfer {
    pub path: String,
    pub attempts: u32,
    pub reason: String,
}

/// Counts for one scope. Each worker fills its own report; the engine merges them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub uploaded: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub failures: Vec<FailedTransfer>,
}

impl TransferReport {
    pub fn record_success(&mut self, direction: Direction) {
        match direction {
            Direction::Save => self.uploaded += 1,
            Direction::Load => self.downloaded += 1,
        }
    }

    pub fn record_failure(&mut self, path: impl Into<String>, attempts: u32, reason: impl Into<String>) {
        self.failed += 1;
        self.failures.push(FailedTransfer {
            path: path.into(),
            attempts,
            reason: reason.into(),
        });
    }

    pub fn merge(&mut self, other: TransferReport) {
        self.uploaded += other.uploaded;
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.failures.extend(other.failures);
    }

    pub fn transferred(&self) -> usize {
        self.uploaded + self.downloaded
    }

    /// False when anything failed or was cancelled.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }

    /// Sort failures by path so output does not depend on worker scheduling.
    pub fn sort_failures(&mut self) {
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTransfer {
    pub path: String,
    pub classification: Classification,
    pub bytes: u64,
}

/// What `apply` would do, computed without touching either store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferPlan {
    pub direction: Direction,
    pub transfers: Vec<PlannedTransfer>,
    /// Remote directories to create before uploading, shallowest first.
    pub directories: Vec<String>,
    pub skipped: usize,
}

impl TransferPlan {
    pub fn total_bytes(&self) -> u64 {
        self.transfers.iter().map(|t| t.bytes).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}
