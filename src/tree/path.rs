//! Path canonicalization and normalization utilities

use crate::error::SyncError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonicalize an absolute filesystem path (base root, working directory).
///
/// Resolves symlinks, `..` and `.` via `dunce` so Windows paths stay free of
/// the `\\?\` prefix.
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, SyncError> {
    dunce::canonicalize(path).map_err(|e| {
        SyncError::Config(format!("Failed to canonicalize {}: {}", path.display(), e))
    })
}

/// Normalize a path string: Unicode NFC, no trailing slashes (except root).
pub fn normalize_path_string(path: &str) -> String {
    let normalized: String = path.nfc().collect();

    let mut result = normalized;
    if result.len() > 1 {
        while result.ends_with('/') || result.ends_with('\\') {
            result.pop();
        }
    }

    result
}

/// Path below `root` as a posix string, exactly as stored on disk.
///
/// Returns `None` when `path` is not below `root` or contains components that
/// cannot be represented as a relative posix path.
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => continue,
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Snapshot key of a path below `root`: [`relative_posix`] in Unicode NFC.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    relative_posix(root, path).map(|raw| raw.nfc().collect())
}

/// Parent directory of a posix key, or `None` for top-level entries.
pub fn parent_key(key: &str) -> Option<&str> {
    key.rfind('/').map(|idx| &key[..idx])
}
