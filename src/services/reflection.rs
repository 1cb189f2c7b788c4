//! Reflection evaluator: judges whether the gathered findings answer the
//! research question.
//!
//! The sufficiency verdict is a completion-service judgment with no
//! deterministic ground truth, so the evaluator is deliberately
//! conservative: an ambiguous, malformed, or missing verdict reads as
//! insufficient and the loop keeps researching. The round budget is the
//! hard stop, which makes that bias safe. Total failure after retries
//! degrades the same way instead of failing the session.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::planner::extract_json_object;
use crate::domain::models::Finding;
use crate::domain::ports::completion::{CompletionClient, CompletionRequest};
use crate::infrastructure::retry::RetryPolicy;

/// Sufficiency verdict with the updated gap set.
#[derive(Debug, Clone, PartialEq)]
pub struct Reflection {
    pub sufficient: bool,
    pub gaps: Vec<String>,
}

/// Expected completion payload.
#[derive(Debug, Deserialize)]
struct ReflectionPayload {
    is_sufficient: bool,
    #[serde(default)]
    knowledge_gap: Option<String>,
    #[serde(default)]
    follow_up_queries: Vec<String>,
}

/// Judges evidence sufficiency once per round.
pub struct ReflectionEvaluator {
    completion: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    max_tokens: usize,
}

impl ReflectionEvaluator {
    pub fn new(completion: Arc<dyn CompletionClient>, retry: RetryPolicy, max_tokens: usize) -> Self {
        Self {
            completion,
            retry,
            max_tokens,
        }
    }

    /// Evaluate the findings gathered so far.
    ///
    /// Never fails: retry exhaustion returns `sufficient = false` with the
    /// gap set unchanged, preserving forward progress toward the round
    /// budget.
    #[instrument(skip_all, fields(findings = findings.len()))]
    pub async fn evaluate(
        &self,
        original_query: &str,
        findings: &[Finding],
        current_gaps: &[String],
    ) -> Reflection {
        if findings.is_empty() {
            debug!("no findings to judge, reporting insufficient");
            return Reflection {
                sufficient: false,
                gaps: current_gaps.to_vec(),
            };
        }

        let prompt = build_prompt(original_query, findings);

        let verdict = self
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

                parse_reflection(&response.text)
            })
            .await;

        match verdict {
            Ok(reflection) => reflection,
            Err(err) => {
                warn!(error = %err, "reflection unavailable, defaulting to insufficient");
                Reflection {
                    sufficient: false,
                    gaps: current_gaps.to_vec(),
                }
            }
        }
    }
}

fn build_prompt(original_query: &str, findings: &[Finding]) -> String {
    let mut prompt = format!(
        "You are a research assistant analyzing evidence gathered for the \
         question: \"{original_query}\".\n\n\
         Instructions:\n\
         - Decide whether the evidence below is sufficient to answer the question.\n\
         - If it is not, identify the knowledge gaps and write self-contained \
         follow-up search queries that would close them.\n\n\
         Format your response as a JSON object with exactly these keys:\n\
         - \"is_sufficient\": true or false\n\
         - \"knowledge_gap\": what information is missing (\"\" if sufficient)\n\
         - \"follow_up_queries\": a list of search query strings ([] if sufficient)\n\n\
         Evidence:\n"
    );

    for (index, finding) in findings.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] {} ({})\n{}\n\n",
            index + 1,
            finding.title,
            finding.url,
            finding.snippet
        ));
    }

    prompt
}

/// Parse the verdict; a payload that cannot be read is an attempt failure.
fn parse_reflection(text: &str) -> Result<Reflection, String> {
    let json = extract_json_object(text).ok_or("completion contained no JSON object")?;
    let payload: ReflectionPayload = serde_json::from_str(json)
        .map_err(|err| format!("unparsable reflection payload: {err}"))?;

    let mut gaps: Vec<String> = payload
        .follow_up_queries
        .into_iter()
        .map(|gap| gap.trim().to_string())
        .filter(|gap| !gap.is_empty())
        .collect();

    if gaps.is_empty() {
        if let Some(gap) = payload.knowledge_gap {
            let trimmed = gap.trim();
            if !trimmed.is_empty() {
                gaps.push(trimmed.to_string());
            }
        }
    }

    // An insufficient verdict with no gap to pursue is ambiguous; keep it
    // insufficient and let the budget bound the loop.
    Ok(Reflection {
        sufficient: payload.is_sufficient,
        gaps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sufficient_verdict() {
        let text = r#"{"is_sufficient": true, "knowledge_gap": "", "follow_up_queries": []}"#;
        let reflection = parse_reflection(text).unwrap();
        assert!(reflection.sufficient);
        assert!(reflection.gaps.is_empty());
    }

    #[test]
    fn test_parse_insufficient_with_follow_ups() {
        let text = r#"{"is_sufficient": false, "knowledge_gap": "no long-term data",
                       "follow_up_queries": ["caffeine long-term sleep studies"]}"#;
        let reflection = parse_reflection(text).unwrap();
        assert!(!reflection.sufficient);
        assert_eq!(reflection.gaps, vec!["caffeine long-term sleep studies"]);
    }

    #[test]
    fn test_knowledge_gap_fallback_when_no_queries() {
        let text = r#"{"is_sufficient": false, "knowledge_gap": "missing dosage data",
                       "follow_up_queries": []}"#;
        let reflection = parse_reflection(text).unwrap();
        assert_eq!(reflection.gaps, vec!["missing dosage data"]);
    }

    #[test]
    fn test_malformed_payload_is_error() {
        assert!(parse_reflection("not json").is_err());
        assert!(parse_reflection(r#"{"is_sufficient": "maybe"}"#).is_err());
        assert!(parse_reflection(r#"{"follow_up_queries": []}"#).is_err());
    }

    #[test]
    fn test_parse_fenced_payload() {
        let text = "```json\n{\"is_sufficient\": true, \"knowledge_gap\": \"\", \"follow_up_queries\": []}\n```";
        assert!(parse_reflection(text).unwrap().sufficient);
    }
}
