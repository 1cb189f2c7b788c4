use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for search provider operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One result row from the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Source locator
    pub url: String,

    /// Result title
    pub title: String,

    /// Retrieved text excerpt
    pub snippet: String,

    /// Provider relevance score
    #[serde(default)]
    pub score: f64,
}

/// Port trait for the external web-search collaborator.
///
/// A query may legitimately return zero hits; that is a success, not an
/// error. Provider failures (network, auth, rate limit) surface as `Err`
/// and are classified and retried by the adapter before reaching the
/// research loop.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query, returning hits in provider ranking order.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}
