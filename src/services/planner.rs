//! Query planner: turns the research question and open knowledge gaps
//! into a bounded list of distinct search queries.
//!
//! Round 0 plans from the question alone. Later rounds put the unresolved
//! gaps in front of the completion service so follow-up queries target
//! what is still missing. The completion is asked for a JSON payload; an
//! unparsable or empty result counts as a failed attempt and is retried
//! like a timeout, because both leave the round without queries.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::ResearchError;
use crate::domain::ports::completion::{CompletionClient, CompletionRequest};
use crate::infrastructure::retry::RetryPolicy;

/// Expected completion payload.
#[derive(Debug, Deserialize)]
struct PlanPayload {
    #[serde(default)]
    #[allow(dead_code)]
    rationale: Option<String>,
    #[serde(default)]
    query: Vec<String>,
}

/// Plans each round's search queries.
pub struct QueryPlanner {
    completion: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    fan_out: usize,
    max_tokens: usize,
}

impl QueryPlanner {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        retry: RetryPolicy,
        fan_out: usize,
        max_tokens: usize,
    ) -> Self {
        Self {
            completion,
            retry,
            fan_out,
            max_tokens,
        }
    }

    /// Produce 1..=fan_out distinct search queries for the next round.
    #[instrument(skip(self, gaps), fields(gap_count = gaps.len()))]
    pub async fn plan(
        &self,
        original_query: &str,
        gaps: &[String],
    ) -> Result<Vec<String>, ResearchError> {
        let prompt = self.build_prompt(original_query, gaps);

        let queries = self
            .retry
            .execute(|| async {
                let response = self
                    .completion
                    .complete(CompletionRequest {
                        prompt: prompt.clone(),
                        system: None,
                        max_tokens: self.max_tokens,
                        temperature: Some(0.0),
                    })
                    .await
                    .map_err(|err| err.to_string())?;

                parse_queries(&response.text, self.fan_out)
            })
            .await
            .map_err(ResearchError::Planning)?;

        debug!(count = queries.len(), "planned search queries");
        Ok(queries)
    }

    fn build_prompt(&self, original_query: &str, gaps: &[String]) -> String {
        let mut prompt = format!(
            "Your goal is to generate diverse, focused web search queries for an \
             automated research tool.\n\n\
             Instructions:\n\
             - Generate at most {} queries, each covering one distinct aspect.\n\
             - Prefer fewer queries when the question is narrow; never pad with \
             near-duplicates.\n\
             - Use concise keyword phrasing suited to a search engine.\n\n\
             Format your response as a JSON object with exactly these keys:\n\
             - \"rationale\": brief explanation of why these queries are relevant\n\
             - \"query\": a list of search query strings\n\n\
             Research question: {}\n",
            self.fan_out, original_query
        );

        if !gaps.is_empty() {
            prompt.push_str(
                "\nEarlier research rounds left these knowledge gaps unresolved. \
                 Target them preferentially:\n",
            );
            for gap in gaps {
                prompt.push_str("- ");
                prompt.push_str(gap);
                prompt.push('\n');
            }
        }

        prompt
    }
}

/// Parse the planner payload out of a completion, tolerating fenced code
/// blocks and surrounding prose.
fn parse_queries(text: &str, fan_out: usize) -> Result<Vec<String>, String> {
    let json = extract_json_object(text).ok_or("completion contained no JSON object")?;
    let payload: PlanPayload =
        serde_json::from_str(json).map_err(|err| format!("unparsable planner payload: {err}"))?;

    let mut queries: Vec<String> = Vec::new();
    for query in payload.query {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            continue;
        }
        if queries
            .iter()
            .any(|existing: &String| existing.eq_ignore_ascii_case(trimmed))
        {
            continue;
        }
        queries.push(trimmed.to_string());
    }
    queries.truncate(fan_out);

    if queries.is_empty() {
        return Err("planner payload contained no usable queries".to_string());
    }
    Ok(queries)
}

/// Slice out the first JSON object in a completion, fenced or bare.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let candidate = match text.find("```") {
        Some(fence_start) => {
            let after_fence = &text[fence_start + 3..];
            let body_start = after_fence.find('\n').map_or(0, |pos| pos + 1);
            let body = &after_fence[body_start..];
            match body.find("```") {
                Some(fence_end) => &body[..fence_end],
                None => body,
            }
        }
        None => text,
    };

    let open = candidate.find('{')?;
    let close = candidate.rfind('}')?;
    (close > open).then(|| &candidate[open..=close])
}
