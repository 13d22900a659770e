//! Environment sources.
//!
//! `BASESYNC_*` variables map onto config keys with `__` between sections,
//! e.g. `BASESYNC_TRANSFER__WORKERS=4`. The legacy `BASE_PATH` and
//! `YANDEX_DISK_TOKEN` variables are honored when their `BASESYNC_`
//! counterparts are unset.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "BASESYNC";
pub const LEGACY_BASE_PATH: &str = "BASE_PATH";
pub const LEGACY_TOKEN: &str = "YANDEX_DISK_TOKEN";

const LEGACY: [(&str, &str, &str); 2] = [
    (LEGACY_BASE_PATH, "BASESYNC_BASE_PATH", "base_path"),
    (LEGACY_TOKEN, "BASESYNC_REMOTE__TOKEN", "remote.token"),
];

pub fn add_to_builder(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (legacy, modern, key) in LEGACY {
        if std::env::var_os(modern).is_some() {
            continue;
        }
        if let Ok(value) = std::env::var(legacy) {
            if !value.is_empty() {
                builder = builder.set_override(key, value)?;
            }
        }
    }

    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    ))
}
