//! Common test utilities for integration tests
//!
//! The completion and search collaborators have no deterministic reference
//! implementation, so integration tests script them: `ScriptedCompletion`
//! consumes a fixed sequence of responses (the loop calls it in a known
//! order: plan, reflect, plan, reflect, ..., synthesize), and
//! `ScriptedSearch` maps query text to canned outcomes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use magellan::domain::models::Config;
use magellan::domain::ports::completion::{
    ChunkStream, CompletionChunk, CompletionClient, CompletionRequest, CompletionResponse,
    Result as CompletionResult, Usage,
};
use magellan::domain::ports::search::{Result as SearchResult, SearchHit, SearchProvider};

/// Completion stub that replays a scripted response sequence.
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedCompletion {
    pub fn new(entries: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                entries
                    .into_iter()
                    .map(|entry| entry.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Delay every call, for cancellation-timing tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_entry(&self) -> CompletionResult<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(CompletionResponse {
                text,
                stop_reason: Some("end_turn".to_string()),
                usage: Usage::default(),
            }),
            Some(Err(message)) => Err(message.into()),
            None => Err("completion script exhausted".into()),
        }
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, _request: CompletionRequest) -> CompletionResult<CompletionResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_entry()
    }

    async fn stream(&self, request: CompletionRequest) -> CompletionResult<ChunkStream> {
        let response = self.complete(request).await?;
        let chunks: Vec<CompletionResult<CompletionChunk>> = vec![
            Ok(CompletionChunk {
                delta: Some(response.text),
                stop_reason: None,
            }),
            Ok(CompletionChunk {
                delta: None,
                stop_reason: response.stop_reason,
            }),
        ];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Search stub that maps query text to a canned outcome.
///
/// Unknown queries succeed with zero hits, matching a provider that finds
/// nothing rather than failing.
pub struct ScriptedSearch {
    responses: Mutex<HashMap<String, Result<Vec<SearchHit>, String>>>,
    fail_all: bool,
}

impl ScriptedSearch {
    pub fn new(entries: Vec<(&str, Result<Vec<SearchHit>, &str>)>) -> Self {
        Self {
            responses: Mutex::new(
                entries
                    .into_iter()
                    .map(|(query, outcome)| {
                        (query.to_string(), outcome.map_err(str::to_string))
                    })
                    .collect(),
            ),
            fail_all: false,
        }
    }

    /// A provider where every call fails.
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            fail_all: true,
        }
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str) -> SearchResult<Vec<SearchHit>> {
        if self.fail_all {
            return Err("provider unavailable".into());
        }
        match self.responses.lock().unwrap().remove(query) {
            Some(Ok(hits)) => Ok(hits),
            Some(Err(message)) => Err(message.into()),
            None => Ok(vec![]),
        }
    }
}

/// Search hit pointing at `url`.
pub fn hit(url: &str, title: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: title.to_string(),
        snippet: format!("snippet about {title}"),
        score: 0.5,
    }
}

/// Planner payload listing `queries`.
pub fn plan_json(queries: &[&str]) -> String {
    let list = queries
        .iter()
        .map(|query| format!("\"{query}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{\"rationale\": \"test\", \"query\": [{list}]}}")
}

/// Reflection payload with the given verdict and follow-up queries.
pub fn reflection_json(sufficient: bool, follow_ups: &[&str]) -> String {
    let list = follow_ups
        .iter()
        .map(|gap| format!("\"{gap}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{{\"is_sufficient\": {sufficient}, \"knowledge_gap\": \"\", \"follow_up_queries\": [{list}]}}"
    )
}

/// Config tuned for tests: no retries, tiny backoff.
pub fn test_config(max_rounds: u32, fan_out: usize) -> Config {
    let mut config = Config::default();
    apply_test_settings(&mut config, max_rounds, fan_out);
    config
}

fn apply_test_settings(config: &mut Config, max_rounds: u32, fan_out: usize) {
    config.research.max_rounds = max_rounds;
    config.research.fan_out = fan_out;
    config.research.concurrency_limit = 2;
    config.retry.max_retries = 0;
    config.retry.initial_backoff_ms = 10;
    config.retry.max_backoff_ms = 20;
}
