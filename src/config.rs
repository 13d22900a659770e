//! Configuration System
//!
//! Layered settings for a sync invocation: built-in defaults, the global
//! config file, an explicit `--config` file, `BASESYNC_*` environment
//! variables and finally command-line overrides. Loaded once at startup.

use crate::logging::LoggingConfig;
use crate::orchestrator::OrchestratorSettings;
use crate::transfer::{EngineConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::{ConfigLoader, ConfigOverrides};
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Local knowledge-base root (`<base>/<category>/<project>`)
    #[serde(default)]
    pub base_path: Option<PathBuf>,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub transfer: TransferSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cloud store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// OAuth token for the cloud API
    #[serde(default)]
    pub token: Option<String>,

    /// Remote namespace root; `app:` is the application folder
    #[serde(default = "default_remote_root")]
    pub root: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_remote_root() -> String {
    "app:".to_string()
}

fn default_endpoint() -> String {
    "https://cloud-api.yandex.net/v1/disk".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            root: default_remote_root(),
            endpoint: default_endpoint(),
        }
    }
}

/// Worker pool, retry and timeout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSettings {
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_jitter")]
    pub jitter: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Concurrent directory listings while building a remote snapshot
    #[serde(default = "default_listing_concurrency")]
    pub listing_concurrency: usize,

    /// Projects processed at the same time by save/load/status
    #[serde(default = "default_scope_concurrency")]
    pub scope_concurrency: usize,
}

fn default_workers() -> usize {
    8
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_listing_concurrency() -> usize {
    8
}

fn default_scope_concurrency() -> usize {
    1
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            request_timeout_secs: default_request_timeout_secs(),
            listing_concurrency: default_listing_concurrency(),
            scope_concurrency: default_scope_concurrency(),
        }
    }
}

impl TransferSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            workers: self.workers,
            retry: self.retry_policy(),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            engine: self.engine_config(),
            listing_concurrency: self.listing_concurrency,
            scope_concurrency: self.scope_concurrency,
        }
    }
}

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingBasePath,
    BasePathNotDirectory(PathBuf),
    MissingToken,
    EmptyRemoteRoot,
    ZeroSetting(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingBasePath => write!(
                f,
                "Base path is not configured (set BASE_PATH, BASESYNC_BASE_PATH or --base)"
            ),
            ValidationError::BasePathNotDirectory(path) => {
                write!(f, "Base path is not a directory: {}", path.display())
            }
            ValidationError::MissingToken => write!(
                f,
                "Cloud token is not configured (set YANDEX_DISK_TOKEN or BASESYNC_REMOTE__TOKEN)"
            ),
            ValidationError::EmptyRemoteRoot => write!(f, "remote.root must not be empty"),
            ValidationError::ZeroSetting(key) => write!(f, "{} must be greater than zero", key),
        }
    }
}

impl SyncConfig {
    /// Check every setting, collecting all problems instead of stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match &self.base_path {
            None => errors.push(ValidationError::MissingBasePath),
            Some(path) if !path.is_dir() => {
                errors.push(ValidationError::BasePathNotDirectory(path.clone()))
            }
            Some(_) => {}
        }

        if self
            .remote
            .token
            .as_deref()
            .map_or(true, |token| token.trim().is_empty())
        {
            errors.push(ValidationError::MissingToken);
        }
        if self.remote.root.trim().is_empty() {
            errors.push(ValidationError::EmptyRemoteRoot);
        }

        let transfer = &self.transfer;
        for (key, value) in [
            ("transfer.workers", transfer.workers as u64),
            ("transfer.max_attempts", transfer.max_attempts as u64),
            ("transfer.request_timeout_secs", transfer.request_timeout_secs),
            ("transfer.listing_concurrency", transfer.listing_concurrency as u64),
            ("transfer.scope_concurrency", transfer.scope_concurrency as u64),
        ] {
            if value == 0 {
                errors.push(ValidationError::ZeroSetting(key));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Join validation errors into one message for `SyncError::Config`.
pub fn describe_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
