//! basesync: reconcile a category/project knowledge base with cloud storage
//!
//! A local directory tree `<base>/<category>/<project>/...` is mirrored under a
//! remote root. Each command snapshots both sides, classifies every path, and
//! transfers in one explicit direction: `save` uploads, `load` downloads.
//! Nothing is ever deleted on either side.

pub mod cli;
pub mod config;
pub mod error;
pub mod ignore;
pub mod logging;
pub mod namespace;
pub mod orchestrator;
pub mod reconcile;
pub mod scope;
pub mod store;
pub mod transfer;
pub mod tree;
pub mod types;
