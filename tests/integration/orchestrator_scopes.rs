//! Listing, scope expansion and multi-project commands

use crate::integration::test_utils::{fast_settings, KbFixture};
use basesync::namespace::ProjectRef;
use basesync::orchestrator::{Presence, ScopeOutcome};
use basesync::scope::{resolve, CwdContext, ScopeSelector, Selector};
use basesync::types::Direction;
use chrono::Utc;

fn mixed_fixture() -> KbFixture {
    let fixture = KbFixture::new();
    fixture.write("work/alpha/a.md", "a");
    fixture.write("work/beta/b.md", "b");
    fixture.write("home/garden/plan.md", "plan");
    std::fs::create_dir_all(fixture.path(".trash")).unwrap();
    fixture
        .remote
        .put_file("app:/work/beta/b.md", "b", Utc::now());
    fixture
        .remote
        .put_file("app:/work/gamma/c.md", "c", Utc::now());
    fixture
        .remote
        .put_file("app:/archive/old/x.md", "x", Utc::now());
    fixture
}

#[tokio::test]
async fn test_list_annotates_both_stores() {
    let fixture = mixed_fixture();
    let listing = fixture.orchestrator(fast_settings(2, 1)).list().await.unwrap();

    let names: Vec<&str> = listing.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["archive", "home", "work"]);

    let work = listing.iter().find(|c| c.name == "work").unwrap();
    assert_eq!(work.presence, Presence::Both);
    let presence: Vec<(&str, Presence)> = work
        .projects
        .iter()
        .map(|p| (p.name.as_str(), p.presence))
        .collect();
    assert_eq!(
        presence,
        vec![
            ("alpha", Presence::Local),
            ("beta", Presence::Both),
            ("gamma", Presence::Cloud),
        ]
    );
    assert_eq!(listing[0].presence, Presence::Cloud);
}

#[tokio::test]
async fn test_expand_all_is_sorted_union() {
    let fixture = mixed_fixture();
    let orchestrator = fixture.orchestrator(fast_settings(2, 1));

    let everything = orchestrator
        .expand(&ScopeSelector::everything())
        .await
        .unwrap();
    assert!(everything.unlisted.is_empty());
    assert_eq!(
        everything.projects,
        vec![
            ProjectRef::new("archive", "old"),
            ProjectRef::new("home", "garden"),
            ProjectRef::new("work", "alpha"),
            ProjectRef::new("work", "beta"),
            ProjectRef::new("work", "gamma"),
        ]
    );

    let work = ScopeSelector::new(Selector::Named("work".into()), Selector::All).unwrap();
    assert_eq!(orchestrator.expand(&work).await.unwrap().projects.len(), 3);
}

#[tokio::test]
async fn test_save_everything_skips_cloud_only_projects() {
    let fixture = mixed_fixture();
    let results = fixture
        .orchestrator(fast_settings(2, 1))
        .transfer(&ScopeSelector::everything(), Direction::Save, false)
        .await
        .unwrap();
    assert_eq!(results.len(), 5);

    for result in &results {
        let local = fixture
            .path(&format!("{}/{}", result.project.category, result.project.project))
            .is_dir();
        match &result.outcome {
            ScopeOutcome::Skipped { reason } => {
                assert!(!local, "{} should not be skipped", result.project);
                assert!(reason.contains("load"));
            }
            ScopeOutcome::Completed { report } => {
                assert!(local);
                assert!(report.is_success());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }
    assert!(fixture.remote.get_file("app:/home/garden/plan.md").is_some());
    assert!(fixture.remote.get_file("app:/work/alpha/a.md").is_some());
}

#[tokio::test]
async fn test_load_everything_skips_local_only_projects() {
    let fixture = mixed_fixture();
    let results = fixture
        .orchestrator(fast_settings(2, 1))
        .transfer(&ScopeSelector::everything(), Direction::Load, false)
        .await
        .unwrap();

    let skipped: Vec<String> = results
        .iter()
        .filter(|r| matches!(r.outcome, ScopeOutcome::Skipped { .. }))
        .map(|r| r.project.to_string())
        .collect();
    assert_eq!(skipped, vec!["home/garden", "work/alpha"]);
    assert_eq!(fixture.read("work/gamma/c.md").as_deref(), Some("c"));
    assert_eq!(fixture.read("archive/old/x.md").as_deref(), Some("x"));
}

#[tokio::test]
async fn test_status_of_cloud_only_project_has_hint() {
    let fixture = mixed_fixture();
    let status = fixture
        .orchestrator(fast_settings(2, 1))
        .status(&ScopeSelector::project("work", "gamma"))
        .await
        .unwrap();
    assert!(!status[0].local_exists);
    assert!(status[0].note.as_deref().unwrap().contains("load"));
    assert_eq!(status[0].summary.remote_only, 1);
}

#[test]
fn test_cwd_inference_feeds_selector() {
    let selector = resolve(
        &CwdContext::Project {
            category: "work".into(),
            project: "alpha".into(),
        },
        &[],
    )
    .unwrap();
    assert_eq!(selector, ScopeSelector::project("work", "alpha"));

    let selector = resolve(&CwdContext::Category("work".into()), &["all".to_string()]).unwrap();
    assert_eq!(selector.project_selector(), &Selector::All);

    assert!(resolve(&CwdContext::Outside, &["alpha".to_string()]).is_err());
}

#[tokio::test]
async fn test_unlistable_category_reported_as_category_scope() {
    let fixture = mixed_fixture();
    fixture.remote.fail_always("app:/archive");
    let orchestrator = fixture.orchestrator(fast_settings(2, 1));

    let results = orchestrator
        .transfer(&ScopeSelector::everything(), Direction::Save, false)
        .await
        .unwrap();
    let archive: Vec<_> = results
        .iter()
        .filter(|r| r.project.category == "archive")
        .collect();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].project, ProjectRef::new("archive", "all"));
    assert!(matches!(archive[0].outcome, ScopeOutcome::Failed { .. }));
    assert!(results
        .iter()
        .filter(|r| r.project.category != "archive")
        .all(|r| r.is_success()));
    assert_eq!(
        fixture.remote.get_file("app:/work/alpha/a.md"),
        Some(b"a".to_vec())
    );
    assert_eq!(
        fixture.remote.get_file("app:/home/garden/plan.md"),
        Some(b"plan".to_vec())
    );
}
