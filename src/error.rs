//! Error types for the basesync reconciliation system.

use std::time::Duration;
use thiserror::Error;

/// Store-related errors, shared by the local filesystem and remote store clients.
///
/// `NotFound` is kept distinct from the transport failures so callers can treat
/// "not yet created on this side" as a legitimate state rather than a fault.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited by remote store{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Local I/O error: {0}")]
    LocalIo(String),
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

impl StoreError {
    /// Whether a failed transfer attempt with this error may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Transport(_)
                | StoreError::RateLimited { .. }
                | StoreError::Timeout(_)
                | StoreError::LocalIo(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Server-suggested wait before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            StoreError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(err.to_string())
        } else {
            StoreError::LocalIo(err.to_string())
        }
    }
}

/// Invocation-level errors.
///
/// Only `InvalidScope` and `Config` abort a whole command; per-file store
/// failures are isolated in transfer reports instead of surfacing here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::Config(err.to_string())
    }
}
