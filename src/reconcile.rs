//! Reconciliation of a local and a remote snapshot.
//!
//! Every path present on either side gets exactly one classification. Content
//! is only declared equal on a comparable, equal fingerprint with equal sizes;
//! when content differs or cannot be compared, whole-second modification
//! times pick the newer side, and anything else is divergence.

use crate::tree::snapshot::{Entry, TreeSnapshot};
use crate::types::{Direction, Fingerprint, FingerprintMatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    InSync,
    LocalOnly,
    RemoteOnly,
    /// Both present, content differs or is unknown, and neither side is strictly newer.
    Diverged,
    LocalNewer,
    RemoteNewer,
}

impl Classification {
    /// Classification seen from the other side.
    pub fn mirror(self) -> Self {
        match self {
            Classification::LocalOnly => Classification::RemoteOnly,
            Classification::RemoteOnly => Classification::LocalOnly,
            Classification::LocalNewer => Classification::RemoteNewer,
            Classification::RemoteNewer => Classification::LocalNewer,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Classification::InSync => "in-sync",
            Classification::LocalOnly => "local-only",
            Classification::RemoteOnly => "remote-only",
            Classification::Diverged => "diverged",
            Classification::LocalNewer => "local-newer",
            Classification::RemoteNewer => "remote-newer",
        }
    }

    /// Whether `save` transfers a path with this classification.
    pub fn needs_upload(self) -> bool {
        matches!(
            self,
            Classification::LocalOnly | Classification::LocalNewer | Classification::Diverged
        )
    }

    /// Whether `load` transfers a path with this classification.
    pub fn needs_download(self) -> bool {
        matches!(
            self,
            Classification::RemoteOnly | Classification::RemoteNewer | Classification::Diverged
        )
    }

    pub fn needs_transfer(self, direction: Direction) -> bool {
        match direction {
            Direction::Save => self.needs_upload(),
            Direction::Load => self.needs_download(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One path of the union of both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    pub local: Option<Entry>,
    pub remote: Option<Entry>,
    pub classification: Classification,
}

impl DiffEntry {
    /// Relative path addressing this file on the local side.
    ///
    /// Keeps the local spelling when the file exists locally, else adopts the
    /// remote one, so a transfer never renames a file it overwrites.
    pub fn local_path(&self) -> &str {
        self.stored_path(self.local.as_ref(), self.remote.as_ref())
    }

    /// Relative path addressing this file on the remote side.
    pub fn remote_path(&self) -> &str {
        self.stored_path(self.remote.as_ref(), self.local.as_ref())
    }

    fn stored_path<'a>(&'a self, own: Option<&'a Entry>, other: Option<&'a Entry>) -> &'a str {
        own.or(other)
            .map_or(self.path.as_str(), |entry| entry.stored_path_or(&self.path))
    }
}

/// Classify one path. Returns `None` only when neither side has it.
pub fn classify(local: Option<&Entry>, remote: Option<&Entry>) -> Option<Classification> {
    let (local, remote) = match (local, remote) {
        (None, None) => return None,
        (Some(_), None) => return Some(Classification::LocalOnly),
        (None, Some(_)) => return Some(Classification::RemoteOnly),
        (Some(l), Some(r)) => (l, r),
    };

    if local.size == remote.size
        && Fingerprint::compare(local.fingerprint.as_ref(), remote.fingerprint.as_ref())
            == FingerprintMatch::Equal
    {
        return Some(Classification::InSync);
    }

    let classification = match (local.modified_at, remote.modified_at) {
        (Some(l), Some(r)) if l.timestamp() > r.timestamp() => Classification::LocalNewer,
        (Some(l), Some(r)) if l.timestamp() < r.timestamp() => Classification::RemoteNewer,
        _ => Classification::Diverged,
    };
    Some(classification)
}

/// Diff two snapshots of the same scope, ordered by path.
pub fn diff(local: &TreeSnapshot, remote: &TreeSnapshot) -> Vec<DiffEntry> {
    let paths: BTreeSet<&str> = local.paths().chain(remote.paths()).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let l = local.get(path);
            let r = remote.get(path);
            classify(l, r).map(|classification| DiffEntry {
                path: path.to_string(),
                local: l.cloned(),
                remote: r.cloned(),
                classification,
            })
        })
        .collect()
}

/// Per-classification counts of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub in_sync: usize,
    pub local_only: usize,
    pub remote_only: usize,
    pub diverged: usize,
    pub local_newer: usize,
    pub remote_newer: usize,
}

impl DiffSummary {
    pub fn from_entries(entries: &[DiffEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            match entry.classification {
                Classification::InSync => summary.in_sync += 1,
                Classification::LocalOnly => summary.local_only += 1,
                Classification::RemoteOnly => summary.remote_only += 1,
                Classification::Diverged => summary.diverged += 1,
                Classification::LocalNewer => summary.local_newer += 1,
                Classification::RemoteNewer => summary.remote_newer += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.in_sync
            + self.local_only
            + self.remote_only
            + self.diverged
            + self.local_newer
            + self.remote_newer
    }

    /// True when every path is in sync.
    pub fn is_clean(&self) -> bool {
        self.total() == self.in_sync
    }
}
