//! Shared test utilities for integration tests
//!
//! Knowledge-base fixtures over a temp directory and an in-memory remote, plus
//! serialized access to the environment variables configuration reads.

use basesync::namespace::Namespace;
use basesync::orchestrator::{Orchestrator, OrchestratorSettings};
use basesync::store::MemoryRemoteStore;
use basesync::transfer::{CancelFlag, EngineConfig, RetryPolicy};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: [&str; 8] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "BASE_PATH",
    "YANDEX_DISK_TOKEN",
    "BASESYNC_BASE_PATH",
    "BASESYNC_REMOTE__TOKEN",
    "BASESYNC_REMOTE__ROOT",
    "BASESYNC_TRANSFER__WORKERS",
];

/// Run `f` with HOME and XDG_CONFIG_HOME inside `test_dir` and every
/// basesync variable cleared. The previous environment is restored afterwards.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<_> = ISOLATED_VARS
        .iter()
        .map(|var| (*var, std::env::var_os(var)))
        .collect();
    for var in ISOLATED_VARS {
        std::env::remove_var(var);
    }

    let home = test_dir.path().join("home");
    let config_home = test_dir.path().join("config");
    std::fs::create_dir_all(&home).unwrap();
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    let result = f();

    for (var, value) in saved {
        match value {
            Some(value) => std::env::set_var(var, value),
            None => std::env::remove_var(var),
        }
    }
    result
}

/// Retry without sleeping so failure paths stay fast.
pub fn fast_settings(workers: usize, max_attempts: u32) -> OrchestratorSettings {
    OrchestratorSettings {
        engine: EngineConfig {
            workers,
            retry: RetryPolicy::immediate(max_attempts),
            request_timeout: Duration::from_secs(5),
        },
        listing_concurrency: 4,
        scope_concurrency: 1,
    }
}

/// A local base directory paired with an in-memory remote.
pub struct KbFixture {
    _dir: TempDir,
    pub base: PathBuf,
    pub remote: Arc<MemoryRemoteStore>,
}

impl KbFixture {
    pub fn new() -> Self {
        Self::with_remote(Arc::new(MemoryRemoteStore::new("app:")))
    }

    /// Fresh local base sharing an existing remote.
    pub fn with_remote(remote: Arc<MemoryRemoteStore>) -> Self {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("kb");
        std::fs::create_dir_all(&base).unwrap();
        Self {
            _dir: dir,
            base,
            remote,
        }
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.base, "app:")
    }

    pub fn orchestrator(&self, settings: OrchestratorSettings) -> Orchestrator {
        Orchestrator::new(self.namespace(), self.remote.clone(), settings)
    }

    pub fn orchestrator_with_cancel(
        &self,
        settings: OrchestratorSettings,
        cancel: CancelFlag,
    ) -> Orchestrator {
        self.orchestrator(settings).with_cancel(cancel)
    }

    /// Write a file under `<base>/<relative>`, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.base.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, relative: &str) -> Option<String> {
        std::fs::read_to_string(self.base.join(relative)).ok()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.base.join(relative)
    }
}

/// Every file below `root` as sorted posix relative paths.
pub fn local_files(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir_files(root)
        .into_iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    files.sort();
    files
}

fn walkdir_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walkdir_files(&path));
        } else {
            out.push(path);
        }
    }
    out
}
