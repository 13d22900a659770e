//! Filesystem walker for traversing a project directory

use crate::ignore::SyncIgnore;
use crate::store::local::STAGING_PREFIX;
use crate::tree::path::{normalize_path_string, relative_key, relative_posix};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{trace, warn};
use walkdir::WalkDir;

/// A regular file found by the walker.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    /// Project-relative posix key (NFC).
    pub relative: String,
    /// Project-relative posix path as spelled on disk.
    pub stored: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Filesystem walker configuration
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false)
    pub follow_symlinks: bool,
    /// Project ignore rules
    pub ignore: SyncIgnore,
    /// Maximum depth to traverse (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore: SyncIgnore::default(),
            max_depth: None,
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the directory and collect every regular file below it.
    ///
    /// A missing root yields no files. Entries that vanish or cannot be
    /// stat'ed mid-walk are logged and skipped rather than failing the walk.
    /// Results are sorted by relative path.
    pub fn walk(&self) -> Vec<WalkedFile> {
        let mut files = Vec::new();
        if !self.root.is_dir() {
            return files;
        }

        let root = self.root.clone();
        let ignore = &self.config.ignore;
        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|entry| {
                if entry.path() == root {
                    return true;
                }
                if entry.file_name().to_string_lossy().starts_with(STAGING_PREFIX) {
                    return false;
                }
                match relative_key(&root, entry.path()) {
                    Some(key) => !ignore.is_ignored(&key, entry.file_type().is_dir()),
                    None => false,
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %self.root.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(stored) = relative_posix(&self.root, entry.path()) else {
                continue;
            };
            let relative = normalize_path_string(&stored);

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping file without metadata");
                    continue;
                }
            };

            trace!(path = %relative, size = metadata.len(), "Walked file");
            files.push(WalkedFile {
                relative,
                stored,
                path: entry.path().to_path_buf(),
                size: metadata.len(),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        files
    }
}
