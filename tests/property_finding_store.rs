//! Property tests for finding deduplication.
//!
//! URLs are drawn from a deliberately small alphabet so collisions (and
//! near-collisions differing only in case, fragment, or trailing slash)
//! are frequent.

use proptest::prelude::*;
use std::collections::HashSet;

use magellan::domain::models::{canonical_source_id, Finding};
use magellan::services::FindingStore;

fn url_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("https"), Just("HTTPS"), Just("http")],
        prop_oneof![Just("a.example"), Just("A.Example"), Just("b.example")],
        prop_oneof![Just("papers/1"), Just("papers/2"), Just("x")],
        prop_oneof![Just(""), Just("/"), Just("#frag"), Just("/#frag")],
    )
        .prop_map(|(scheme, host, path, tail)| format!("{scheme}://{host}/{path}{tail}"))
}

proptest! {
    #[test]
    fn no_duplicate_source_ids_survive_insertion(urls in prop::collection::vec(url_strategy(), 0..64)) {
        let mut store = FindingStore::new();
        for url in &urls {
            store.insert(Finding::new("q".into(), url, "t".into(), "s".into()));
        }

        let ids: Vec<_> = store
            .into_findings()
            .into_iter()
            .map(|finding| finding.source_id)
            .collect();

        let unique: HashSet<_> = ids.iter().cloned().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn store_size_matches_distinct_canonical_ids(urls in prop::collection::vec(url_strategy(), 0..64)) {
        let mut store = FindingStore::new();
        for url in &urls {
            store.insert(Finding::new("q".into(), url, "t".into(), "s".into()));
        }

        let distinct: HashSet<_> = urls.iter().map(|url| canonical_source_id(url)).collect();
        prop_assert_eq!(store.len(), distinct.len());
    }

    #[test]
    fn canonicalization_is_idempotent(url in url_strategy()) {
        let once = canonical_source_id(&url);
        let twice = canonical_source_id(&once);
        prop_assert_eq!(once, twice);
    }
}
