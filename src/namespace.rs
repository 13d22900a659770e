//! Category/project namespace and its mapping onto both stores.
//!
//! A knowledge base is a root holding categories, each holding projects, each
//! holding an arbitrary file tree. The same `(category, project)` pair addresses
//! exactly one local directory and exactly one remote path; both are computed by
//! concatenation and never stored.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Literal argument that selects every category or every project.
pub const ALL_TOKEN: &str = "all";

/// A concrete `(category, project)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub category: String,
    pub project: String,
}

impl ProjectRef {
    pub fn new(category: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            project: project.into(),
        }
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.project)
    }
}

/// Check that a category or project name can be used as both a directory name
/// and a remote path segment.
pub fn validate_name(kind: &str, name: &str) -> Result<(), SyncError> {
    if name.is_empty() {
        return Err(SyncError::InvalidScope(format!("{} name cannot be empty", kind)));
    }
    if name == "." || name == ".." {
        return Err(SyncError::InvalidScope(format!(
            "{} name cannot be '{}'",
            kind, name
        )));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(SyncError::InvalidScope(format!(
            "{} name '{}' cannot contain path separators",
            kind, name
        )));
    }
    if name.eq_ignore_ascii_case(ALL_TOKEN) {
        return Err(SyncError::InvalidScope(format!(
            "'{}' is reserved and cannot name a {}",
            name, kind
        )));
    }
    Ok(())
}

/// Address spaces of the two stores.
#[derive(Debug, Clone)]
pub struct Namespace {
    local_root: PathBuf,
    remote_root: String,
}

impl Namespace {
    pub fn new(local_root: impl Into<PathBuf>, remote_root: impl Into<String>) -> Self {
        let remote_root: String = remote_root.into();
        let trimmed = remote_root.trim_end_matches('/').to_string();
        Self {
            local_root: local_root.into(),
            remote_root: trimmed,
        }
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn remote_root(&self) -> &str {
        &self.remote_root
    }

    pub fn category_local(&self, category: &str) -> PathBuf {
        self.local_root.join(category)
    }

    pub fn category_remote(&self, category: &str) -> String {
        join_remote(&self.remote_root, category)
    }

    pub fn project_local(&self, project: &ProjectRef) -> PathBuf {
        self.local_root.join(&project.category).join(&project.project)
    }

    pub fn project_remote(&self, project: &ProjectRef) -> String {
        join_remote(&self.category_remote(&project.category), &project.project)
    }
}

/// Join remote path segments with a single `/`.
pub fn join_remote(base: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return base.to_string();
    }
    if base.ends_with('/') {
        format!("{}{}", base, relative)
    } else {
        format!("{}/{}", base, relative)
    }
}
