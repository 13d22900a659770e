//! In-process remote store.
//!
//! Backs the integration tests and dry experiments: files live in a map keyed
//! by full remote path, directories are explicit, and individual paths can be
//! made to fail a number of times or forever.

use crate::error::StoreError;
use crate::namespace::join_remote;
use crate::store::{ItemKind, RemoteItem, RemoteStore};
use crate::tree::hasher::compute_content_hash;
use crate::types::{Fingerprint, HashAlgorithm};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the store reports as a file fingerprint in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryFingerprint {
    /// SHA-256 of the content, like the cloud store.
    Sha256,
    /// Opaque per-write revision counter.
    Revision,
    /// No fingerprint at all.
    Absent,
}

#[derive(Debug, Clone)]
struct StoredFile {
    data: Vec<u8>,
    modified_at: DateTime<Utc>,
    revision: u64,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Always,
    Times(u32),
}

#[derive(Debug, Default)]
struct CallCounters {
    list: AtomicUsize,
    upload: AtomicUsize,
    download: AtomicUsize,
    create_dir: AtomicUsize,
}

/// Remote store held entirely in memory.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    root: String,
    mode: MemoryFingerprint,
    files: RwLock<BTreeMap<String, StoredFile>>,
    dirs: RwLock<BTreeSet<String>>,
    faults: Mutex<HashMap<String, Fault>>,
    counters: CallCounters,
    next_revision: AtomicUsize,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new("app:")
    }
}

impl MemoryRemoteStore {
    /// Empty store whose only directory is `root`.
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into().trim_end_matches('/').to_string();
        let mut dirs = BTreeSet::new();
        dirs.insert(root.clone());
        Self {
            root,
            mode: MemoryFingerprint::Sha256,
            files: RwLock::new(BTreeMap::new()),
            dirs: RwLock::new(dirs),
            faults: Mutex::new(HashMap::new()),
            counters: CallCounters::default(),
            next_revision: AtomicUsize::new(1),
        }
    }

    pub fn with_fingerprint(mut self, mode: MemoryFingerprint) -> Self {
        self.mode = mode;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Seed a file, creating every missing ancestor directory.
    pub fn put_file(&self, path: &str, data: impl Into<Vec<u8>>, modified_at: DateTime<Utc>) {
        self.ensure_ancestors(path);
        let revision = self.bump_revision();
        self.files.write().insert(
            path.to_string(),
            StoredFile {
                data: data.into(),
                modified_at,
                revision,
            },
        );
    }

    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().get(path).map(|f| f.data.clone())
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.read().contains(path)
    }

    /// Make every operation on `path` fail with a transport error.
    pub fn fail_always(&self, path: &str) {
        self.faults.lock().insert(path.to_string(), Fault::Always);
    }

    /// Make the next `times` operations on `path` fail with a transport error.
    pub fn fail_times(&self, path: &str, times: u32) {
        self.faults.lock().insert(path.to_string(), Fault::Times(times));
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    pub fn list_calls(&self) -> usize {
        self.counters.list.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.counters.upload.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.counters.download.load(Ordering::SeqCst)
    }

    pub fn create_dir_calls(&self) -> usize {
        self.counters.create_dir.load(Ordering::SeqCst)
    }

    fn bump_revision(&self) -> u64 {
        self.next_revision.fetch_add(1, Ordering::SeqCst) as u64
    }

    fn ensure_ancestors(&self, path: &str) {
        let mut dirs = self.dirs.write();
        let mut current = parent_of(path);
        while let Some(dir) = current {
            if dir.len() < self.root.len() || !dirs.insert(dir.to_string()) {
                break;
            }
            current = parent_of(dir);
        }
    }

    fn inject_fault(&self, path: &str) -> Result<(), StoreError> {
        let mut faults = self.faults.lock();
        match faults.get_mut(path) {
            Some(Fault::Always) => Err(StoreError::Transport(format!("injected failure: {}", path))),
            Some(Fault::Times(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                Err(StoreError::Transport(format!("injected failure: {}", path)))
            }
            _ => Ok(()),
        }
    }

    fn file_item(&self, path: &str, file: &StoredFile) -> RemoteItem {
        let fingerprint = match self.mode {
            MemoryFingerprint::Sha256 => Some(Fingerprint::content_hash(
                HashAlgorithm::Sha256,
                compute_content_hash(HashAlgorithm::Sha256, &file.data),
            )),
            MemoryFingerprint::Revision => Some(Fingerprint::revision(file.revision.to_string())),
            MemoryFingerprint::Absent => None,
        };
        RemoteItem {
            name: base_name(path).to_string(),
            path: path.to_string(),
            kind: ItemKind::File,
            size: file.data.len() as u64,
            fingerprint,
            modified_at: Some(file.modified_at),
        }
    }

    fn dir_item(path: &str) -> RemoteItem {
        RemoteItem {
            name: base_name(path).to_string(),
            path: path.to_string(),
            kind: ItemKind::Directory,
            size: 0,
            fingerprint: None,
            modified_at: None,
        }
    }

    fn require_parent(&self, path: &str) -> Result<(), StoreError> {
        match parent_of(path) {
            Some(parent) if self.dirs.read().contains(parent) => Ok(()),
            _ => Err(StoreError::Rejected(format!("parent directory of {} does not exist", path))),
        }
    }
}

fn parent_of(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn native_hash(&self) -> Option<HashAlgorithm> {
        match self.mode {
            MemoryFingerprint::Sha256 => Some(HashAlgorithm::Sha256),
            _ => None,
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<RemoteItem>, StoreError> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        let path = path.trim_end_matches('/');
        self.inject_fault(path)?;

        if self.files.read().contains_key(path) {
            return Err(StoreError::Rejected(format!("{} is not a directory", path)));
        }
        if !self.dirs.read().contains(path) {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let prefix = format!("{}/", path);
        let mut items = Vec::new();
        for dir in self.dirs.read().range(prefix.clone()..) {
            let Some(rest) = dir.strip_prefix(&prefix) else {
                break;
            };
            if !rest.contains('/') {
                items.push(Self::dir_item(&join_remote(path, rest)));
            }
        }
        for (file_path, file) in self.files.read().range(prefix.clone()..) {
            let Some(rest) = file_path.strip_prefix(&prefix) else {
                break;
            };
            if !rest.contains('/') {
                items.push(self.file_item(file_path, file));
            }
        }
        Ok(items)
    }

    async fn stat(&self, path: &str) -> Result<RemoteItem, StoreError> {
        let path = path.trim_end_matches('/');
        self.inject_fault(path)?;
        if let Some(file) = self.files.read().get(path) {
            return Ok(self.file_item(path, file));
        }
        if self.dirs.read().contains(path) {
            return Ok(Self::dir_item(path));
        }
        Err(StoreError::NotFound(path.to_string()))
    }

    async fn create_dir(&self, path: &str) -> Result<(), StoreError> {
        self.counters.create_dir.fetch_add(1, Ordering::SeqCst);
        let path = path.trim_end_matches('/');
        self.inject_fault(path)?;
        if self.files.read().contains_key(path) {
            return Err(StoreError::Rejected(format!("{} is a file", path)));
        }
        if self.dirs.read().contains(path) {
            return Ok(());
        }
        self.require_parent(path)?;
        self.dirs.write().insert(path.to_string());
        Ok(())
    }

    async fn upload(&self, local_file: &Path, remote_path: &str) -> Result<(), StoreError> {
        self.counters.upload.fetch_add(1, Ordering::SeqCst);
        self.inject_fault(remote_path)?;
        self.require_parent(remote_path)?;
        if self.dirs.read().contains(remote_path) {
            return Err(StoreError::Rejected(format!("{} is a directory", remote_path)));
        }

        let data = tokio::fs::read(local_file).await?;
        let revision = self.bump_revision();
        self.files.write().insert(
            remote_path.to_string(),
            StoredFile {
                data,
                modified_at: Utc::now(),
                revision,
            },
        );
        Ok(())
    }

    async fn download(&self, remote_path: &str, local_file: &Path) -> Result<(), StoreError> {
        self.counters.download.fetch_add(1, Ordering::SeqCst);
        self.inject_fault(remote_path)?;
        let data = self
            .files
            .read()
            .get(remote_path)
            .map(|f| f.data.clone())
            .ok_or_else(|| StoreError::NotFound(remote_path.to_string()))?;
        tokio::fs::write(local_file, data).await?;
        Ok(())
    }
}
