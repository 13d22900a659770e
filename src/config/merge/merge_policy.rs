//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key: defaults < global file < explicit file <
//! environment < command-line overrides.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("remote.root", "app:")?
        .set_default("remote.endpoint", "https://cloud-api.yandex.net/v1/disk")?
        .set_default("transfer.workers", 8i64)?
        .set_default("transfer.max_attempts", 4i64)?
        .set_default("transfer.base_delay_ms", 500i64)?
        .set_default("transfer.max_delay_ms", 30_000i64)?
        .set_default("transfer.jitter", true)?
        .set_default("transfer.request_timeout_secs", 60i64)?
        .set_default("transfer.listing_concurrency", 8i64)?
        .set_default("transfer.scope_concurrency", 1i64)
}
