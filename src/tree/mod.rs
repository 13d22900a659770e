//! File tree snapshots
//!
//! Both stores are described the same way: a flat, ordered map from
//! project-relative posix path to file entry. Directories are implied.

pub mod builder;
pub mod hasher;
pub mod path;
pub mod snapshot;
pub mod walker;

pub use builder::{build_local, build_remote, SnapshotOptions};
pub use snapshot::{Entry, EntryKind, TreeSnapshot};
