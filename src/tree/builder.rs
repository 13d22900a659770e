//! Snapshot builders for both sides of a scope.
//!
//! The local builder walks the project directory and hashes every file. The
//! remote builder lists the remote project breadth-first and trusts the
//! fingerprints the store reports; it never downloads content.

use crate::error::StoreError;
use crate::store::{with_timeout, RemoteItem, RemoteStore};
use crate::ignore::SyncIgnore;
use crate::tree::hasher;
use crate::tree::path::normalize_path_string;
use crate::tree::snapshot::{Entry, TreeSnapshot};
use crate::tree::walker::{Walker, WalkerConfig};
use crate::types::HashAlgorithm;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Options shared by the local and remote builders of one scope.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Algorithm for local content hashes; match the remote's native hash when it has one.
    pub hash: HashAlgorithm,
    pub ignore: SyncIgnore,
    /// Directories listed concurrently per breadth-first level.
    pub listing_concurrency: usize,
    /// Deadline for each remote listing call.
    pub request_timeout: Duration,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Blake3,
            ignore: SyncIgnore::default(),
            listing_concurrency: 8,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl SnapshotOptions {
    /// Options whose local hash matches what `store` reports natively.
    pub fn for_store(store: &dyn RemoteStore) -> Self {
        Self {
            hash: store.native_hash().unwrap_or(HashAlgorithm::Blake3),
            ..Self::default()
        }
    }

    pub fn with_ignore(mut self, ignore: SyncIgnore) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_listing_concurrency(mut self, listing_concurrency: usize) -> Self {
        self.listing_concurrency = listing_concurrency.max(1);
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Snapshot the local tree under `scope_dir`.
///
/// A missing directory is an empty snapshot. Files that cannot be read are
/// logged and left out, so they never count as present on this side.
#[instrument(skip(scope_dir, options), fields(scope = %scope_dir.display()))]
pub fn build_local(scope_dir: &Path, options: &SnapshotOptions) -> TreeSnapshot {
    let start = Instant::now();
    let walker = Walker::with_config(
        scope_dir.to_path_buf(),
        WalkerConfig {
            ignore: options.ignore.clone(),
            ..WalkerConfig::default()
        },
    );

    let mut snapshot = TreeSnapshot::new();
    for file in walker.walk() {
        match hasher::fingerprint_file(&file.path, options.hash) {
            Ok(fingerprint) => {
                let entry = Entry::file(file.size, Some(fingerprint), file.modified_at)
                    .stored_as(file.stored, &file.relative);
                snapshot.insert(file.relative, entry);
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "Excluding unreadable file");
            }
        }
    }

    debug!(
        files = snapshot.len(),
        bytes = snapshot.total_size(),
        duration_ms = start.elapsed().as_millis(),
        "Local snapshot built"
    );
    snapshot
}

/// Snapshot the remote tree under `scope_path`.
///
/// `NotFound` on the scope itself is an empty snapshot; any other failure of
/// the scope listing is returned. A failing listing below the scope is logged
/// and that subtree is left out.
#[instrument(skip(store, options), fields(store = store.name()))]
pub async fn build_remote(
    store: &dyn RemoteStore,
    scope_path: &str,
    options: &SnapshotOptions,
) -> Result<TreeSnapshot, StoreError> {
    let start = Instant::now();
    let root = scope_path.trim_end_matches('/');
    let mut snapshot = TreeSnapshot::new();

    let top = match with_timeout(options.request_timeout, store.list(root)).await {
        Ok(items) => items,
        Err(e) if e.is_not_found() => {
            debug!(scope = root, "Remote scope does not exist");
            return Ok(snapshot);
        }
        Err(e) => return Err(e),
    };

    let root_dir = ListedDir::default();
    let mut frontier = absorb_listing(&mut snapshot, &root_dir, top, &options.ignore);
    while !frontier.is_empty() {
        let listings: Vec<_> = stream::iter(frontier)
            .map(|dir| async move {
                let remote_dir = format!("{}/{}", root, dir.stored);
                let result = with_timeout(options.request_timeout, store.list(&remote_dir)).await;
                (dir, result)
            })
            .buffer_unordered(options.listing_concurrency.max(1))
            .collect()
            .await;

        let mut next = Vec::new();
        for (dir, result) in listings {
            match result {
                Ok(items) => next.extend(absorb_listing(&mut snapshot, &dir, items, &options.ignore)),
                Err(e) => warn!(directory = %dir.key, error = %e, "Excluding subtree after failed listing"),
            }
        }
        next.sort();
        frontier = next;
    }

    debug!(
        files = snapshot.len(),
        bytes = snapshot.total_size(),
        duration_ms = start.elapsed().as_millis(),
        "Remote snapshot built"
    );
    Ok(snapshot)
}

/// A remote directory below the scope: its snapshot key and its stored relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
struct ListedDir {
    key: String,
    stored: String,
}

impl ListedDir {
    fn child(&self, key_name: &str, stored_name: &str) -> Self {
        if self.key.is_empty() {
            Self {
                key: key_name.to_string(),
                stored: stored_name.to_string(),
            }
        } else {
            Self {
                key: format!("{}/{}", self.key, key_name),
                stored: format!("{}/{}", self.stored, stored_name),
            }
        }
    }
}

/// Record the files of one listing and return the subdirectories to descend into.
fn absorb_listing(
    snapshot: &mut TreeSnapshot,
    parent: &ListedDir,
    items: Vec<RemoteItem>,
    ignore: &SyncIgnore,
) -> Vec<ListedDir> {
    let mut subdirs = Vec::new();
    for item in items {
        let name = normalize_path_string(&item.name);
        if name.is_empty() || name.contains('/') || item.name.contains('/') {
            warn!(name = %item.name, "Skipping remote item with unusable name");
            continue;
        }
        let child = parent.child(&name, &item.name);
        if ignore.is_ignored(&child.key, item.is_dir()) {
            continue;
        }
        if item.is_dir() {
            subdirs.push(child);
        } else {
            let entry = Entry::file(item.size, item.fingerprint, item.modified_at)
                .stored_as(child.stored, &child.key);
            snapshot.insert(child.key, entry);
        }
    }
    subdirs
}
