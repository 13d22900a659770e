//! save / load end to end over the in-memory remote

use crate::integration::test_utils::{fast_settings, local_files, KbFixture};
use basesync::orchestrator::{CommandOutcome, ScopeOutcome, ScopeTransfer};
use basesync::reconcile::Classification;
use basesync::scope::ScopeSelector;
use basesync::transfer::{CancelFlag, TransferReport};
use basesync::types::Direction;
use std::sync::Arc;

fn report(result: &ScopeTransfer) -> &TransferReport {
    match &result.outcome {
        ScopeOutcome::Completed { report } => report,
        other => panic!("unexpected outcome for {}: {:?}", result.project, other),
    }
}

fn seed(fixture: &KbFixture) {
    fixture.write("work/alpha/readme.md", "# alpha\n");
    fixture.write("work/alpha/notes/2024/jan.md", "cold\n");
    fixture.write("work/alpha/notes/2024/feb.md", "colder\n");
    fixture.write("work/alpha/assets/logo.svg", "<svg/>");
}

#[tokio::test]
async fn test_second_save_transfers_nothing() {
    let fixture = KbFixture::new();
    seed(&fixture);
    let orchestrator = fixture.orchestrator(fast_settings(4, 2));
    let selector = ScopeSelector::project("work", "alpha");

    let first = orchestrator
        .transfer(&selector, Direction::Save, false)
        .await
        .unwrap();
    assert_eq!(report(&first[0]).uploaded, 4);

    let second = orchestrator
        .transfer(&selector, Direction::Save, false)
        .await
        .unwrap();
    let second = report(&second[0]);
    assert_eq!(second.uploaded, 0);
    assert_eq!(second.skipped, 4);
    assert_eq!(fixture.remote.upload_calls(), 4);

    let status = orchestrator.status(&selector).await.unwrap();
    assert!(status[0].summary.is_clean());
    assert_eq!(status[0].summary.in_sync, 4);
}

#[tokio::test]
async fn test_save_then_load_reproduces_the_tree() {
    let source = KbFixture::new();
    seed(&source);
    source
        .orchestrator(fast_settings(4, 2))
        .transfer(&ScopeSelector::project("work", "alpha"), Direction::Save, false)
        .await
        .unwrap();

    let target = KbFixture::with_remote(Arc::clone(&source.remote));
    let results = target
        .orchestrator(fast_settings(4, 2))
        .transfer(&ScopeSelector::project("work", "alpha"), Direction::Load, false)
        .await
        .unwrap();
    assert_eq!(report(&results[0]).downloaded, 4);

    assert_eq!(local_files(&source.base), local_files(&target.base));
    for file in local_files(&source.base) {
        assert_eq!(source.read(&file), target.read(&file), "{}", file);
    }
    assert!(!local_files(&target.base)
        .iter()
        .any(|f| f.contains(".basesync-partial-")));
}

#[tokio::test]
async fn test_nothing_is_deleted_on_either_side() {
    let fixture = KbFixture::new();
    seed(&fixture);
    let orchestrator = fixture.orchestrator(fast_settings(2, 2));
    let selector = ScopeSelector::project("work", "alpha");
    orchestrator
        .transfer(&selector, Direction::Save, false)
        .await
        .unwrap();

    std::fs::remove_file(fixture.path("work/alpha/readme.md")).unwrap();
    let results = orchestrator
        .transfer(&selector, Direction::Save, false)
        .await
        .unwrap();
    assert_eq!(report(&results[0]).uploaded, 0);
    assert!(fixture
        .remote
        .get_file("app:/work/alpha/readme.md")
        .is_some());

    let status = orchestrator.status(&selector).await.unwrap();
    let readme = status[0]
        .entries
        .iter()
        .find(|e| e.path == "readme.md")
        .unwrap();
    assert_eq!(readme.classification, Classification::RemoteOnly);

    fixture.write("work/alpha/local-draft.md", "draft");
    let results = orchestrator
        .transfer(&selector, Direction::Load, false)
        .await
        .unwrap();
    assert_eq!(report(&results[0]).downloaded, 1);
    assert_eq!(fixture.read("work/alpha/readme.md").as_deref(), Some("# alpha\n"));
    assert_eq!(fixture.read("work/alpha/local-draft.md").as_deref(), Some("draft"));
}

#[tokio::test]
async fn test_dry_run_changes_nothing() {
    let fixture = KbFixture::new();
    seed(&fixture);
    let orchestrator = fixture.orchestrator(fast_settings(2, 2));
    let results = orchestrator
        .transfer(&ScopeSelector::project("work", "alpha"), Direction::Save, true)
        .await
        .unwrap();

    let ScopeOutcome::Planned { plan } = &results[0].outcome else {
        panic!("expected a plan");
    };
    assert_eq!(plan.transfers.len(), 4);
    assert!(plan.directories.contains(&"app:/work/alpha".to_string()));
    assert_eq!(fixture.remote.upload_calls(), 0);
    assert_eq!(fixture.remote.create_dir_calls(), 0);
    assert!(fixture.remote.file_paths().is_empty());
}

#[tokio::test]
async fn test_cancelled_save_reports_failure() {
    let fixture = KbFixture::new();
    seed(&fixture);
    let cancel = CancelFlag::new();
    cancel.cancel();
    let orchestrator = fixture.orchestrator_with_cancel(fast_settings(2, 2), cancel);

    let results = orchestrator
        .transfer(&ScopeSelector::project("work", "alpha"), Direction::Save, false)
        .await
        .unwrap();
    assert!(matches!(results[0].outcome, ScopeOutcome::Cancelled));
    assert_eq!(fixture.remote.upload_calls(), 0);
    assert_eq!(CommandOutcome::Transfers(results).exit_code(), 1);
}

#[tokio::test]
async fn test_decomposed_names_round_trip_unchanged() {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/cafe\u{0301}.md", "espresso");
    let orchestrator = fixture.orchestrator(fast_settings(2, 2));
    let selector = ScopeSelector::project("work", "alpha");

    let saved = orchestrator
        .transfer(&selector, Direction::Save, false)
        .await
        .unwrap();
    assert_eq!(report(&saved[0]).uploaded, 1, "{:?}", report(&saved[0]).failures);
    assert_eq!(
        fixture.remote.get_file("app:/work/alpha/cafe\u{0301}.md"),
        Some(b"espresso".to_vec())
    );
    let status = orchestrator.status(&selector).await.unwrap();
    assert!(status[0].summary.is_clean());

    fixture.remote.put_file(
        "app:/work/alpha/nai\u{0308}ve/re\u{0301}sume\u{0301}.md",
        "cv",
        chrono::Utc::now(),
    );
    let loaded = orchestrator
        .transfer(&selector, Direction::Load, false)
        .await
        .unwrap();
    assert_eq!(report(&loaded[0]).downloaded, 1, "{:?}", report(&loaded[0]).failures);
    assert_eq!(
        fixture.read("work/alpha/nai\u{0308}ve/re\u{0301}sume\u{0301}.md").as_deref(),
        Some("cv")
    );

    let status = orchestrator.status(&selector).await.unwrap();
    assert!(status[0].summary.is_clean());
    assert_eq!(status[0].summary.in_sync, 2);
}
