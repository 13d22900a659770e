//! Normalized description of one store's file tree under a scope.

use crate::tree::path::parent_key;
use crate::types::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One path in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    /// Size in bytes (files only; zero for directories).
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    /// Relative path as this side stores it, when it differs from the snapshot key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,
}

impl Entry {
    pub fn file(size: u64, fingerprint: Option<Fingerprint>, modified_at: Option<DateTime<Utc>>) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            fingerprint,
            modified_at,
            stored_path: None,
        }
    }

    /// Record the stored relative path when it is spelled differently from `key`.
    pub fn stored_as(mut self, stored: String, key: &str) -> Self {
        self.stored_path = (stored != key).then_some(stored);
        self
    }

    /// Relative path to address this entry on its own side.
    pub fn stored_path_or<'a>(&'a self, key: &'a str) -> &'a str {
        self.stored_path.as_deref().unwrap_or(key)
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Ordered map from project-relative posix path to entry.
///
/// Only files are stored. Directories are implied by the paths of their
/// descendants and can be recovered with [`TreeSnapshot::directories`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    entries: BTreeMap<String, Entry>,
}

impl TreeSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file entry. Directory entries are dropped since they are implied.
    pub fn insert(&mut self, path: impl Into<String>, entry: Entry) {
        if entry.is_file() {
            self.entries.insert(path.into(), entry);
        }
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total bytes of all files.
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|e| e.size).sum()
    }

    /// Every directory implied by the stored file paths, in path order.
    pub fn directories(&self) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        for path in self.entries.keys() {
            let mut current = parent_key(path);
            while let Some(dir) = current {
                if !dirs.insert(dir.to_string()) {
                    break;
                }
                current = parent_key(dir);
            }
        }
        dirs
    }
}

impl FromIterator<(String, Entry)> for TreeSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Entry)>>(iter: I) -> Self {
        let mut snapshot = TreeSnapshot::new();
        for (path, entry) in iter {
            snapshot.insert(path, entry);
        }
        snapshot
    }
}
