//! Diff invariants over generated snapshots

use basesync::reconcile::{diff, Classification, DiffSummary};
use basesync::tree::{Entry, TreeSnapshot};
use basesync::types::{Fingerprint, HashAlgorithm};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// (size, content id, mtime seconds, revision-only fingerprint)
type RawEntry = (u8, u8, i64, bool);

fn entry((size, content, secs, revision): RawEntry) -> Entry {
    let fingerprint = if revision {
        Fingerprint::revision(format!("rev-{}", content))
    } else {
        Fingerprint::content_hash(HashAlgorithm::Blake3, format!("{:02x}", content))
    };
    Entry::file(
        size as u64,
        Some(fingerprint),
        Some(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()),
    )
}

fn snapshot(raw: &BTreeMap<String, RawEntry>) -> TreeSnapshot {
    raw.iter()
        .map(|(path, value)| (path.clone(), entry(*value)))
        .collect()
}

fn raw_snapshot() -> impl Strategy<Value = BTreeMap<String, RawEntry>> {
    prop::collection::btree_map(
        "[a-c]{1,2}(/[a-c]{1,2}){0,2}\\.md",
        (0u8..4, 0u8..4, 0i64..4, any::<bool>()),
        0..12,
    )
}

proptest! {
    #[test]
    fn diff_is_reflexive(raw in raw_snapshot()) {
        let snap = snapshot(&raw);
        let entries = diff(&snap, &snap);
        prop_assert_eq!(entries.len(), snap.len());
        for entry in &entries {
            prop_assert_eq!(entry.classification, Classification::InSync);
        }
    }

    #[test]
    fn diff_is_symmetric_under_mirror(a in raw_snapshot(), b in raw_snapshot()) {
        let (a, b) = (snapshot(&a), snapshot(&b));
        let forward = diff(&a, &b);
        let backward = diff(&b, &a);
        prop_assert_eq!(forward.len(), backward.len());
        for (f, r) in forward.iter().zip(backward.iter()) {
            prop_assert_eq!(&f.path, &r.path);
            prop_assert_eq!(f.classification.mirror(), r.classification);
        }
    }

    #[test]
    fn diff_covers_union_in_order(a in raw_snapshot(), b in raw_snapshot()) {
        let (sa, sb) = (snapshot(&a), snapshot(&b));
        let entries = diff(&sa, &sb);
        let expected: Vec<&String> = a.keys().chain(b.keys()).collect::<std::collections::BTreeSet<_>>().into_iter().collect();
        let actual: Vec<&String> = entries.iter().map(|e| &e.path).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(DiffSummary::from_entries(&entries).total(), entries.len());
    }

    #[test]
    fn equal_size_without_equal_fingerprint_is_never_in_sync(
        raw in raw_snapshot(),
        other in raw_snapshot(),
    ) {
        let (sa, sb) = (snapshot(&raw), snapshot(&other));
        for entry in diff(&sa, &sb) {
            if entry.classification == Classification::InSync {
                let (l, r) = (entry.local.unwrap(), entry.remote.unwrap());
                prop_assert_eq!(l.size, r.size);
                let has_fingerprint = l.fingerprint.is_some();
                prop_assert!(has_fingerprint);
                prop_assert_eq!(l.fingerprint, r.fingerprint);
            }
        }
    }

    #[test]
    fn transfer_sets_respect_direction(a in raw_snapshot(), b in raw_snapshot()) {
        for entry in diff(&snapshot(&a), &snapshot(&b)) {
            let c = entry.classification;
            if c.needs_upload() {
                prop_assert!(entry.local.is_some());
            }
            if c.needs_download() {
                prop_assert!(entry.remote.is_some());
            }
            prop_assert!(!(c == Classification::InSync && (c.needs_upload() || c.needs_download())));
        }
    }
}
