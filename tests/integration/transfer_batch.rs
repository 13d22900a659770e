//! Batch transfers with partial failures and retries

use crate::integration::test_utils::{fast_settings, KbFixture};
use basesync::namespace::ProjectRef;
use basesync::orchestrator::{CommandOutcome, ScopeOutcome};
use basesync::reconcile::diff;
use basesync::scope::ScopeSelector;
use basesync::store::RemoteStore;
use basesync::transfer::{EngineConfig, RetryPolicy, TransferEngine, TransferTarget};
use basesync::tree::{build_local, SnapshotOptions, TreeSnapshot};
use basesync::types::Direction;
use std::sync::Arc;
use std::time::Duration;

fn seed_ten(fixture: &KbFixture) {
    for i in 0..10 {
        fixture.write(&format!("work/alpha/f{:02}.txt", i), &format!("payload {}", i));
    }
}

#[tokio::test]
async fn test_one_permanent_failure_does_not_stop_the_batch() {
    let fixture = KbFixture::new();
    seed_ten(&fixture);
    fixture.remote.fail_always("app:/work/alpha/f04.txt");

    let orchestrator = fixture.orchestrator(fast_settings(4, 3));
    let results = orchestrator
        .transfer(&ScopeSelector::project("work", "alpha"), Direction::Save, false)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let ScopeOutcome::Completed { report } = &results[0].outcome else {
        panic!("unexpected outcome: {:?}", results[0].outcome);
    };
    assert_eq!(report.uploaded, 9);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, "f04.txt");
    assert_eq!(report.failures[0].attempts, 3);
    assert!(report.failures[0].reason.contains("injected failure"));

    let uploaded = fixture.remote.file_paths();
    assert_eq!(uploaded.len(), 9);
    assert!(!uploaded.contains(&"app:/work/alpha/f04.txt".to_string()));

    assert_eq!(CommandOutcome::Transfers(results).exit_code(), 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried_to_success() {
    let fixture = KbFixture::new();
    seed_ten(&fixture);
    fixture.remote.fail_times("app:/work/alpha/f07.txt", 2);

    let orchestrator = fixture.orchestrator(fast_settings(3, 3));
    let results = orchestrator
        .transfer(&ScopeSelector::project("work", "alpha"), Direction::Save, false)
        .await
        .unwrap();

    let ScopeOutcome::Completed { report } = &results[0].outcome else {
        panic!("unexpected outcome: {:?}", results[0].outcome);
    };
    assert_eq!(report.uploaded, 10);
    assert!(report.is_success());
    assert_eq!(fixture.remote.upload_calls(), 12);
    assert_eq!(CommandOutcome::Transfers(results).exit_code(), 0);
}

#[tokio::test]
async fn test_engine_with_single_worker_matches_parallel_result() {
    for workers in [1, 8] {
        let fixture = KbFixture::new();
        seed_ten(&fixture);
        fixture.remote.fail_always("app:/work/alpha/f04.txt");

        let project = ProjectRef::new("work", "alpha");
        let target = TransferTarget::for_project(&fixture.namespace(), &project);
        let options = SnapshotOptions::for_store(fixture.remote.as_ref());
        let local = build_local(&target.local_dir, &options);
        let entries = diff(&local, &TreeSnapshot::new());

        let remote: Arc<dyn RemoteStore> = fixture.remote.clone();
        let engine = TransferEngine::new(
            remote,
            EngineConfig {
                workers,
                retry: RetryPolicy::immediate(2),
                request_timeout: Duration::from_secs(5),
            },
        );
        let report = engine.apply(&entries, Direction::Save, &target).await;
        assert_eq!(report.uploaded, 9, "workers = {}", workers);
        assert_eq!(report.failed, 1, "workers = {}", workers);
        assert_eq!(report.failures[0].attempts, 2);
    }
}
