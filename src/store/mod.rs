//! Store collaborators
//!
//! The remote blob space is reached through the [`RemoteStore`] trait: an
//! opaque key/blob API addressed by path strings. The local side is plain
//! filesystem access through [`LocalFs`].

pub mod local;
pub mod memory;
pub mod yandex;

pub use local::LocalFs;
pub use memory::{MemoryFingerprint, MemoryRemoteStore};
pub use yandex::YandexDiskStore;

use crate::error::StoreError;
use crate::types::{Fingerprint, HashAlgorithm};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Item type reported by a remote listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Directory,
}

/// A remote file or directory as reported by `list` or `stat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Base name.
    pub name: String,
    /// Full remote path, in the same address space as the request.
    pub path: String,
    pub kind: ItemKind,
    pub size: u64,
    pub fingerprint: Option<Fingerprint>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl RemoteItem {
    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Directory
    }
}

/// Remote blob storage client.
///
/// Every operation distinguishes `StoreError::NotFound` from transport
/// failures. Implementations must be safe for path-disjoint concurrent use.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable store name for logs and output.
    fn name(&self) -> &str;

    /// Content hash the store reports natively in listings, if any.
    fn native_hash(&self) -> Option<HashAlgorithm>;

    /// Immediate children of a directory.
    async fn list(&self, path: &str) -> Result<Vec<RemoteItem>, StoreError>;

    /// Metadata of a single path.
    async fn stat(&self, path: &str) -> Result<RemoteItem, StoreError>;

    /// Create one directory. Succeeds when it already exists.
    async fn create_dir(&self, path: &str) -> Result<(), StoreError>;

    /// Replace the remote object at `remote_path` with the content of `local_file`.
    async fn upload(&self, local_file: &Path, remote_path: &str) -> Result<(), StoreError>;

    /// Write the remote object at `remote_path` into `local_file`.
    async fn download(&self, remote_path: &str, local_file: &Path) -> Result<(), StoreError>;
}

/// Run a store call with a deadline; elapsing is reported as `StoreError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}
