//! Deduplicated finding storage for one session.
//!
//! Search queries within a round complete concurrently, but every merge
//! goes through `insert` on the single store the executor owns for the
//! round, so the no-duplicate-source invariant holds without locking the
//! session itself.

use std::collections::HashSet;

use crate::domain::models::Finding;

/// Session-scoped store of deduplicated findings.
#[derive(Debug, Default)]
pub struct FindingStore {
    findings: Vec<Finding>,
    seen: HashSet<String>,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a source as already known without storing a finding, so
    /// earlier rounds' sources are rejected as duplicates.
    pub fn mark_seen(&mut self, source_id: &str) {
        self.seen.insert(source_id.to_string());
    }

    /// Insert one finding. Returns false when a finding with the same
    /// `source_id` is already present; the duplicate is discarded.
    pub fn insert(&mut self, finding: Finding) -> bool {
        if self.seen.contains(&finding.source_id) {
            return false;
        }
        self.seen.insert(finding.source_id.clone());
        self.findings.push(finding);
        true
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Consume the store, yielding findings in insertion order.
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(url: &str) -> Finding {
        Finding::new("q".into(), url, "t".into(), "s".into())
    }

    #[test]
    fn test_insert_rejects_duplicate_source() {
        let mut store = FindingStore::new();

        assert!(store.insert(finding("https://a.example/paper")));
        assert!(!store.insert(finding("https://a.example/paper")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_rejects_equivalent_locators() {
        let mut store = FindingStore::new();

        assert!(store.insert(finding("https://a.example/paper")));
        // Same canonical source: fragment and trailing slash differ
        assert!(!store.insert(finding("https://A.example/paper/#intro")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut store = FindingStore::new();
        store.insert(finding("https://c.example/3"));
        store.insert(finding("https://a.example/1"));
        store.insert(finding("https://b.example/2"));

        let urls: Vec<_> = store
            .into_findings()
            .into_iter()
            .map(|f| f.source_id)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://c.example/3",
                "https://a.example/1",
                "https://b.example/2"
            ]
        );
    }

    #[test]
    fn test_mark_seen_blocks_known_sources() {
        let mut store = FindingStore::new();
        store.mark_seen("https://a.example/1");

        assert!(!store.insert(finding("https://a.example/1")));
        assert!(store.insert(finding("https://b.example/2")));
        assert_eq!(store.len(), 1);
    }
}
