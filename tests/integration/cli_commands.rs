//! CLI parsing and command routing against the in-memory remote

use crate::integration::test_utils::KbFixture;
use basesync::cli::{map_error, Cli, Commands, RunContext};
use basesync::config::{SyncConfig, TransferSettings};
use basesync::error::SyncError;
use basesync::scope::CwdContext;
use basesync::store::RemoteStore;
use basesync::transfer::CancelFlag;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;

fn config_for(fixture: &KbFixture) -> SyncConfig {
    SyncConfig {
        base_path: Some(fixture.base.clone()),
        transfer: TransferSettings {
            workers: 2,
            max_attempts: 2,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
            ..TransferSettings::default()
        },
        ..SyncConfig::default()
    }
}

fn context(fixture: &KbFixture, cwd: &Path) -> RunContext {
    let remote: Arc<dyn RemoteStore> = fixture.remote.clone();
    RunContext::with_store(&config_for(fixture), remote, cwd, CancelFlag::new()).unwrap()
}

fn command(args: &[&str]) -> Commands {
    let mut argv = vec!["basesync"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

#[test]
fn test_usage_errors_are_rejected_by_clap() {
    assert!(Cli::try_parse_from(["basesync"]).is_err());
    assert!(Cli::try_parse_from(["basesync", "sync"]).is_err());
    assert!(Cli::try_parse_from(["basesync", "list", "--format", "yaml"]).is_err());
    let err = Cli::try_parse_from(["basesync", "push"]).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_save_inferred_from_project_directory() {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/a.md", "a");
    fixture.write("work/alpha/sub/b.md", "b");

    let ctx = context(&fixture, &fixture.path("work/alpha/sub"));
    assert_eq!(
        ctx.cwd_context(),
        &CwdContext::Project {
            category: "work".to_string(),
            project: "alpha".to_string(),
        }
    );
    let output = ctx.execute(&command(&["save"])).await.unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.rendered.contains("work/alpha"));
    assert!(output.rendered.contains("2 uploaded"));
    assert!(fixture.remote.get_file("app:/work/alpha/sub/b.md").is_some());
}

#[tokio::test]
async fn test_category_directory_requires_a_project_argument() {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/a.md", "a");

    let ctx = context(&fixture, &fixture.path("work"));
    let err = ctx.execute(&command(&["save"])).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidScope(_)));
    assert!(map_error(&err).contains("Usage"));

    let output = ctx.execute(&command(&["save", "alpha"])).await.unwrap();
    assert_eq!(output.exit_code, 0);
}

#[tokio::test]
async fn test_outside_base_needs_two_arguments() {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/a.md", "a");
    let elsewhere = tempfile::TempDir::new().unwrap();

    let ctx = context(&fixture, elsewhere.path());
    assert!(ctx.execute(&command(&["status", "alpha"])).await.is_err());
    assert!(ctx.execute(&command(&["status", "all", "alpha"])).await.is_err());

    let output = ctx
        .execute(&command(&["status", "work", "alpha", "--format", "json"]))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output.rendered).unwrap();
    assert_eq!(json["scopes"][0]["summary"]["local_only"], 1);
    assert_eq!(json["scopes"][0]["entries"][0]["path"], "a.md");
}

#[tokio::test]
async fn test_failed_transfer_sets_exit_code() {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/a.md", "a");
    fixture.write("work/alpha/b.md", "b");
    fixture.remote.fail_always("app:/work/alpha/b.md");

    let ctx = context(&fixture, &fixture.base);
    let output = ctx
        .execute(&command(&["save", "work", "alpha"]))
        .await
        .unwrap();
    assert_eq!(output.exit_code, 1);
    assert!(output.rendered.contains("b.md"));
    assert!(output.rendered.contains("injected failure"));
}

#[tokio::test]
async fn test_list_json_from_base_directory() {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/a.md", "a");

    let ctx = context(&fixture, &fixture.base);
    let output = ctx
        .execute(&command(&["list", "--format", "json"]))
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&output.rendered).unwrap();
    assert_eq!(json["categories"][0]["name"], "work");
    assert_eq!(json["categories"][0]["projects"][0]["presence"], "local");
    assert_eq!(output.exit_code, 0);
}

#[test]
fn test_new_context_rejects_incomplete_config() {
    let fixture = KbFixture::new();
    let mut config = config_for(&fixture);
    config.remote.token = None;
    let err = RunContext::new(&config, &fixture.base, CancelFlag::new())
        .err()
        .unwrap();
    assert!(matches!(err, SyncError::Config(ref m) if m.contains("token")));
}
