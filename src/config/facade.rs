//! Config facade: single entry for loading configuration.

use super::merge::merge_policy;
use super::sources::{environment, explicit_file, global_file};
use super::SyncConfig;
use crate::error::SyncError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command-line values that take precedence over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_path: Option<PathBuf>,
    pub workers: Option<usize>,
}

impl ConfigOverrides {
    fn apply(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        let base_path = self
            .base_path
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned());
        builder
            .set_override_option("base_path", base_path)?
            .set_override_option("transfer.workers", self.workers.map(|n| n as i64))
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from every layer.
    ///
    /// Order (lowest → highest): defaults, global file, `explicit` file,
    /// environment, `overrides`. Validation is left to the caller.
    pub fn load(
        explicit: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<SyncConfig, SyncError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            builder = explicit_file::add_to_builder(builder, path)?;
        }
        builder = environment::add_to_builder(builder)?;
        builder = overrides.apply(builder)?;

        let config: SyncConfig = builder.build()?.try_deserialize()?;
        debug!(
            base_path = ?config.base_path,
            remote_root = %config.remote.root,
            workers = config.transfer.workers,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load a single file on top of the defaults, ignoring every other layer.
    pub fn load_from_file(path: &Path) -> Result<SyncConfig, SyncError> {
        let builder = explicit_file::add_to_builder(merge_policy::builder_with_defaults()?, path)?;
        Ok(builder.build()?.try_deserialize()?)
    }
}
