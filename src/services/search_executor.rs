//! Search executor: runs one round's queries against the search provider.
//!
//! Queries run concurrently up to the configured limit, but every merge
//! into the finding store happens in the single consuming loop, so
//! inserts are serialized and the duplicate-source invariant holds no
//! matter how queries interleave. Transport-level retries live in the
//! provider adapter; by the time an error reaches the executor the query
//! has already exhausted its attempts.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::finding_store::FindingStore;
use crate::domain::errors::ResearchError;
use crate::domain::models::Finding;
use crate::domain::ports::search::SearchProvider;

/// Outcome of one search round.
#[derive(Debug)]
pub struct RoundOutcome {
    /// Findings not seen in any earlier round, in merge order
    pub new_findings: Vec<Finding>,
    /// Hits rejected because their source was already known
    pub duplicates: usize,
    /// Queries that failed after adapter-level retries
    pub failed_queries: usize,
}

impl RoundOutcome {
    /// A round is degraded when at least one query contributed nothing.
    pub fn is_degraded(&self) -> bool {
        self.failed_queries > 0
    }
}

/// Executes one round of concurrent searches.
pub struct SearchExecutor {
    search: Arc<dyn SearchProvider>,
    concurrency_limit: usize,
}

impl SearchExecutor {
    pub fn new(search: Arc<dyn SearchProvider>, concurrency_limit: usize) -> Self {
        assert!(concurrency_limit >= 1, "concurrency_limit must be at least 1");
        Self {
            search,
            concurrency_limit,
        }
    }

    /// Run the round's queries, deduplicating against `existing` findings.
    ///
    /// Per-query failures are non-fatal and logged; the round errors only
    /// when every query fails.
    #[instrument(skip_all, fields(queries = queries.len()))]
    pub async fn run_round(
        &self,
        queries: &[String],
        existing: &[Finding],
    ) -> Result<RoundOutcome, ResearchError> {
        let mut store = FindingStore::new();
        for finding in existing {
            store.mark_seen(&finding.source_id);
        }

        let mut results = stream::iter(queries.iter().cloned().map(|query| {
            let search = Arc::clone(&self.search);
            async move {
                let outcome = search.search(&query).await;
                (query, outcome)
            }
        }))
        .buffer_unordered(self.concurrency_limit);

        let mut duplicates = 0usize;
        let mut failed_queries = 0usize;

        while let Some((query, outcome)) = results.next().await {
            match outcome {
                Ok(hits) => {
                    debug!(query, hits = hits.len(), "query completed");
                    for hit in hits {
                        let finding = Finding::new(query.clone(), &hit.url, hit.title, hit.snippet);
                        if !store.insert(finding) {
                            duplicates += 1;
                        }
                    }
                }
                Err(err) => {
                    warn!(query, error = %err, "query failed, contributing no findings");
                    failed_queries += 1;
                }
            }
        }

        if !queries.is_empty() && failed_queries == queries.len() {
            return Err(ResearchError::SearchProvider(format!(
                "all {} queries failed",
                queries.len()
            )));
        }

        if failed_queries > 0 {
            warn!(
                failed_queries,
                total = queries.len(),
                "degraded search round"
            );
        }

        Ok(RoundOutcome {
            new_findings: store.into_findings(),
            duplicates,
            failed_queries,
        })
    }
}
