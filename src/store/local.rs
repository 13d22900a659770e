//! Local filesystem primitives used by the orchestrator and transfer engine.

use crate::error::StoreError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name prefix of in-progress downloads. The walker never reports these.
pub const STAGING_PREFIX: &str = ".basesync-partial-";

/// Local filesystem access.
#[derive(Debug, Clone, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    /// Names of the visible subdirectories of `path`, sorted.
    ///
    /// A missing directory lists as empty. Hidden entries (leading `.`) are
    /// skipped since they cannot be categories or projects.
    pub fn list_dirs(&self, path: &Path) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::LocalIo(format!("{}: {}", path.display(), e))),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::LocalIo(format!("{}: {}", path.display(), e)))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if entry.path().is_dir() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    /// Create parent directories of `target` and return the sibling staging
    /// path a download should be written to before [`LocalFs::commit`].
    pub fn prepare_download(&self, target: &Path) -> Result<PathBuf, StoreError> {
        let parent = target
            .parent()
            .ok_or_else(|| StoreError::LocalIo(format!("{} has no parent", target.display())))?;
        fs::create_dir_all(parent)
            .map_err(|e| StoreError::LocalIo(format!("{}: {}", parent.display(), e)))?;
        let file_name = target
            .file_name()
            .ok_or_else(|| StoreError::LocalIo(format!("{} has no file name", target.display())))?;
        Ok(parent.join(format!("{}{}", STAGING_PREFIX, file_name.to_string_lossy())))
    }

    /// Atomically move a fully written staging file into place.
    pub fn commit(&self, staging: &Path, target: &Path) -> Result<(), StoreError> {
        if target.is_dir() {
            return Err(StoreError::LocalIo(format!(
                "{} is a directory, refusing to replace it with a file",
                target.display()
            )));
        }
        fs::rename(staging, target)
            .map_err(|e| StoreError::LocalIo(format!("{}: {}", target.display(), e)))?;
        debug!(path = %target.display(), "Committed download");
        Ok(())
    }

    /// Remove a leftover staging file; missing files are fine.
    pub fn discard(&self, staging: &Path) {
        if let Err(e) = fs::remove_file(staging) {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(path = %staging.display(), error = %e, "Failed to remove staging file");
            }
        }
    }
}
