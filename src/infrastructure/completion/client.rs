//! HTTP adapter for the hosted completion service.
//!
//! Implements the `CompletionClient` port against an Anthropic-style
//! messages API: pooled reqwest client, token-bucket rate limiting shared
//! process-wide, and exponential-backoff retries for transient failures.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::CompletionApiError;
use super::streaming::SseChunkStream;
use crate::domain::models::{CompletionConfig, RetryConfig};
use crate::domain::ports::completion::{
    ChunkStream, CompletionClient, CompletionRequest, CompletionResponse, Usage,
};
use crate::infrastructure::rate_limiter::TokenBucketRateLimiter;
use crate::infrastructure::retry::RetryPolicy;

const API_VERSION: &str = "2023-06-01";

/// Wire request for the messages endpoint.
#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Wire response from the messages endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContentBlock>,
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}

/// HTTP client for the completion service.
pub struct HttpCompletionClient {
    /// Reusable HTTP client with connection pooling
    http_client: ReqwestClient,
    api_key: String,
    base_url: String,
    model: String,
    /// Process-wide bucket shared with every other session
    rate_limiter: Arc<TokenBucketRateLimiter>,
    retry_policy: RetryPolicy,
}

impl HttpCompletionClient {
    pub fn new(
        config: &CompletionConfig,
        retry: &RetryConfig,
        rate_limiter: Arc<TokenBucketRateLimiter>,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("MAGELLAN_COMPLETION_API_KEY").ok())
            .context("completion API key not configured")?;

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
            model: config.model.clone(),
            rate_limiter,
            retry_policy: RetryPolicy::from_config(retry),
        })
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest, stream: bool) -> ApiRequest<'a> {
        ApiRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            messages: vec![ApiMessage {
                role: "user",
                content: &request.prompt,
            }],
            system: request.system.as_deref(),
            temperature: request.temperature,
            stream,
        }
    }

    async fn post(
        &self,
        body: &ApiRequest<'_>,
    ) -> std::result::Result<reqwest::Response, CompletionApiError> {
        let response = self
            .http_client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CompletionApiError::Timeout
                } else {
                    CompletionApiError::NetworkError(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error response".to_string());
            return Err(CompletionApiError::from_status(status, body));
        }

        Ok(response)
    }

    async fn send_request(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<CompletionResponse, CompletionApiError> {
        self.rate_limiter.acquire().await;

        let body = self.build_request(request, false);
        let response = self.post(&body).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(CompletionApiError::NetworkError)?;

        let text = api_response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        debug!(
            input_tokens = api_response.usage.input_tokens,
            output_tokens = api_response.usage.output_tokens,
            "completion received"
        );

        Ok(CompletionResponse {
            text,
            stop_reason: api_response.stop_reason,
            usage: Usage {
                input_tokens: api_response.usage.input_tokens,
                output_tokens: api_response.usage.output_tokens,
            },
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> crate::domain::ports::completion::Result<CompletionResponse> {
        let response = self
            .retry_policy
            .execute_if(CompletionApiError::is_transient, || {
                self.send_request(&request)
            })
            .await?;

        Ok(response)
    }

    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> crate::domain::ports::completion::Result<ChunkStream> {
        self.rate_limiter.acquire().await;

        let body = self.build_request(&request, true);
        let response = self.post(&body).await?;

        Ok(Box::pin(SseChunkStream::new(response.bytes_stream())))
    }
}
