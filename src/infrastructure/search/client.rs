//! HTTP adapter for the web-search provider.
//!
//! Implements the `SearchProvider` port against a JSON POST search API:
//! the request carries the query and result budget, the response is an
//! ordered result list with url/title/content/score per row. Shares the
//! process-wide retry policy shape and its own token bucket.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::SearchApiError;
use crate::domain::models::{RetryConfig, SearchConfig};
use crate::domain::ports::search::{SearchHit, SearchProvider};
use crate::infrastructure::rate_limiter::TokenBucketRateLimiter;
use crate::infrastructure::retry::RetryPolicy;

/// Wire request for the search endpoint.
#[derive(Debug, Serialize)]
struct ApiSearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

/// Wire response from the search endpoint.
#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    results: Vec<ApiSearchResult>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResult {
    url: String,
    title: String,
    content: String,
    #[serde(default)]
    score: f64,
}

/// HTTP client for the search provider.
pub struct HttpSearchProvider {
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    max_results: usize,
    /// Process-wide bucket shared with every other session
    rate_limiter: Arc<TokenBucketRateLimiter>,
    retry_policy: RetryPolicy,
}

impl HttpSearchProvider {
    pub fn new(
        config: &SearchConfig,
        retry: &RetryConfig,
        rate_limiter: Arc<TokenBucketRateLimiter>,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("MAGELLAN_SEARCH_API_KEY").ok())
            .context("search API key not configured")?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
            rate_limiter,
            retry_policy: RetryPolicy::from_config(retry),
        })
    }

    async fn send_request(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<SearchHit>, SearchApiError> {
        self.rate_limiter.acquire().await;

        let body = ApiSearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SearchApiError::Timeout
                } else {
                    SearchApiError::NetworkError(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(SearchApiError::from_status(status, body));
        }

        let api_response: ApiSearchResponse = response
            .json()
            .await
            .map_err(SearchApiError::NetworkError)?;

        debug!(query, hits = api_response.results.len(), "search completed");

        Ok(api_response
            .results
            .into_iter()
            .map(|result| SearchHit {
                url: result.url,
                title: result.title,
                snippet: result.content,
                score: result.score,
            })
            .collect())
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str) -> crate::domain::ports::search::Result<Vec<SearchHit>> {
        let hits = self
            .retry_policy
            .execute_if(SearchApiError::is_transient, || self.send_request(query))
            .await?;

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ProviderRateLimit;

    fn provider_for(server_url: &str) -> HttpSearchProvider {
        let config = SearchConfig {
            api_key: Some("test-key".into()),
            base_url: server_url.to_string(),
            max_results: 3,
            ..SearchConfig::default()
        };
        let retry = RetryConfig {
            max_retries: 1,
            initial_backoff_ms: 10,
            max_backoff_ms: 50,
        };
        let limit = ProviderRateLimit::default();
        HttpSearchProvider::new(
            &config,
            &retry,
            Arc::new(TokenBucketRateLimiter::with_burst(
                limit.requests_per_second,
                f64::from(limit.burst_size),
            )),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_results_in_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(
                r#"{"results":[
                    {"url":"https://a.example/1","title":"A","content":"first","score":0.9},
                    {"url":"https://b.example/2","title":"B","content":"second","score":0.4}
                ]}"#,
            )
            .create_async()
            .await;

        let provider = provider_for(&server.url());
        let hits = provider.search("caffeine sleep").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://a.example/1");
        assert_eq!(hits[0].snippet, "first");
        assert_eq!(hits[1].title, "B");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_zero_results_is_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server.url());
        let hits = provider.search("no such topic").await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .with_status(500)
            .with_body("boom")
            .expect(2) // initial attempt + 1 retry
            .create_async()
            .await;

        let provider = provider_for(&server.url());
        let result = provider.search("q").await;

        assert!(result.is_err());
        mock.assert_async().await;
    }
}
