//! CLI route: single route table and run context. Dispatches to the orchestrator and presentation.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_listing_json, format_listing_text, format_status_json, format_status_text,
    format_transfers_json, format_transfers_text,
};
use crate::cli::{command_name, help::scope_args};
use crate::config::{describe_errors, SyncConfig};
use crate::error::SyncError;
use crate::namespace::Namespace;
use crate::orchestrator::{CommandOutcome, Orchestrator};
use crate::scope::{resolve, CwdContext};
use crate::store::{RemoteStore, YandexDiskStore};
use crate::transfer::CancelFlag;
use crate::tree::path::canonicalize_path;
use crate::types::Direction;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Rendered command output and the process exit code it implies.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rendered: String,
    pub exit_code: i32,
}

/// Runtime context for CLI execution: the orchestrator plus where the command was started.
pub struct RunContext {
    orchestrator: Orchestrator,
    cwd: CwdContext,
}

impl RunContext {
    /// Validate `config` and connect to the cloud store it names.
    pub fn new(config: &SyncConfig, cwd: &Path, cancel: CancelFlag) -> Result<Self, SyncError> {
        config
            .validate()
            .map_err(|errors| SyncError::Config(describe_errors(&errors)))?;
        let token = config.remote.token.clone().unwrap_or_default();
        let store = YandexDiskStore::new(
            token,
            config.remote.endpoint.clone(),
            config.transfer.request_timeout(),
        )?;
        Self::with_store(config, Arc::new(store), cwd, cancel)
    }

    /// Build a context over an already constructed remote store.
    pub fn with_store(
        config: &SyncConfig,
        remote: Arc<dyn RemoteStore>,
        cwd: &Path,
        cancel: CancelFlag,
    ) -> Result<Self, SyncError> {
        let base = config
            .base_path
            .as_deref()
            .ok_or_else(|| SyncError::Config("Base path is not configured".to_string()))?;
        let base = canonicalize_path(base)?;
        let cwd = canonicalize_path(cwd).map_or(CwdContext::Outside, |cwd| {
            CwdContext::from_paths(&base, &cwd)
        });
        debug!(base = %base.display(), cwd = ?cwd, store = remote.name(), "Run context ready");

        let namespace = Namespace::new(base, config.remote.root.clone());
        let orchestrator = Orchestrator::new(
            namespace,
            remote,
            config.transfer.orchestrator_settings(),
        )
        .with_cancel(cancel);
        Ok(Self { orchestrator, cwd })
    }

    pub fn cwd_context(&self) -> &CwdContext {
        &self.cwd
    }

    /// Run one command. Errors here abort the invocation; per-project and
    /// per-file failures are carried in the output and its exit code instead.
    pub async fn execute(&self, command: &Commands) -> Result<RunOutput, SyncError> {
        let name = command_name(command);
        let started = Instant::now();
        info!(command = name, "Command started");

        let (outcome, rendered) = match command {
            Commands::List { format } => {
                let categories = self.orchestrator.list().await?;
                let rendered = match format {
                    OutputFormat::Text => format_listing_text(&categories),
                    OutputFormat::Json => format_listing_json(&categories)?,
                };
                (CommandOutcome::Listed(categories), rendered)
            }
            Commands::Status {
                format,
                all_entries,
                ..
            } => {
                let selector = resolve(&self.cwd, scope_args(command))?;
                let scopes = self.orchestrator.status(&selector).await?;
                let rendered = match format {
                    OutputFormat::Text => format_status_text(&scopes, *all_entries),
                    OutputFormat::Json => format_status_json(&scopes, *all_entries)?,
                };
                (CommandOutcome::Status(scopes), rendered)
            }
            Commands::Save {
                dry_run, format, ..
            } => {
                self.run_transfer(command, Direction::Save, *dry_run, *format)
                    .await?
            }
            Commands::Load {
                dry_run, format, ..
            } => {
                self.run_transfer(command, Direction::Load, *dry_run, *format)
                    .await?
            }
        };

        let exit_code = outcome.exit_code();
        info!(
            command = name,
            exit_code,
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        Ok(RunOutput {
            rendered,
            exit_code,
        })
    }

    async fn run_transfer(
        &self,
        command: &Commands,
        direction: Direction,
        dry_run: bool,
        format: OutputFormat,
    ) -> Result<(CommandOutcome, String), SyncError> {
        let selector = resolve(&self.cwd, scope_args(command))?;
        let scopes = self
            .orchestrator
            .transfer(&selector, direction, dry_run)
            .await?;
        let rendered = match format {
            OutputFormat::Text => format_transfers_text(&scopes),
            OutputFormat::Json => format_transfers_json(&scopes)?,
        };
        Ok((CommandOutcome::Transfers(scopes), rendered))
    }
}
