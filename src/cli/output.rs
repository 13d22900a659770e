//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::SyncError;
use crate::scope::USAGE;

/// Map domain errors to a string for CLI output. Scope mistakes carry the usage hint.
pub fn map_error(e: &SyncError) -> String {
    match e {
        SyncError::InvalidScope(_) => format!("{}\n\n{}", e, USAGE.trim_end()),
        _ => e.to_string(),
    }
}
