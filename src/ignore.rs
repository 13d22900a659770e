//! Per-project ignore rules.
//!
//! Each project may carry a `.syncignore` file at its root using gitignore
//! syntax (comments, `!` negation, trailing `/` for directory-only rules). When
//! the file does not exist, we behave as if it contained `.git`. The same rules
//! are applied to the local walk and to the remote listing so both snapshots
//! describe the same subset of the tree. The `.syncignore` file itself is
//! synchronized like any other file.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Name of the per-project ignore file.
pub const SYNCIGNORE_FILE: &str = ".syncignore";

/// Rules used when the project has no `.syncignore`.
const DEFAULT_RULES: &[&str] = &[".git"];

/// Compiled ignore rules for one project.
#[derive(Debug, Clone)]
pub struct SyncIgnore {
    matcher: Gitignore,
}

impl Default for SyncIgnore {
    fn default() -> Self {
        Self::from_rules(&DEFAULT_RULES.join("\n"))
    }
}

impl SyncIgnore {
    /// Rules that ignore nothing.
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Compile rules from `.syncignore` text. Invalid lines are skipped.
    pub fn from_rules(text: &str) -> Self {
        let mut builder = GitignoreBuilder::new(Path::new(""));
        for line in text.lines() {
            if let Err(e) = builder.add_line(None, line) {
                warn!(line, error = %e, "Skipping invalid ignore rule");
            }
        }
        let matcher = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to compile ignore rules, ignoring nothing");
            Gitignore::empty()
        });
        Self { matcher }
    }

    /// Load rules from `<project_dir>/.syncignore`, falling back to the defaults.
    pub fn load(project_dir: &Path) -> Self {
        let path = project_dir.join(SYNCIGNORE_FILE);
        if !path.is_file() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_rules(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read .syncignore, using defaults");
                Self::default()
            }
        }
    }

    /// Whether a project-relative posix path is excluded, either directly or
    /// through one of its parent directories.
    pub fn is_ignored(&self, relative: &str, is_dir: bool) -> bool {
        let relative = relative.trim_start_matches("./").trim_start_matches('/');
        if relative.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(Path::new(relative), is_dir)
            .is_ignore()
    }
}
