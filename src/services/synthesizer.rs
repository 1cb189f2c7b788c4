//! Report synthesizer: composes the final cited report from the frozen
//! finding set.
//!
//! The completion service writes the body against a numbered source
//! digest and cites with `[n]` markers; citation bookkeeping is
//! deterministic post-processing over that body. With zero findings there
//! is nothing to cite and nothing to ask the model, so the synthesizer
//! emits a fixed inconclusive report marked degraded.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::ResearchError;
use crate::domain::models::{Finding, Report};
use crate::domain::ports::completion::{CompletionClient, CompletionRequest};
use crate::infrastructure::retry::RetryPolicy;

/// Synthesizes the terminal report.
pub struct ReportSynthesizer {
    completion: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    max_tokens: usize,
}

impl ReportSynthesizer {
    pub fn new(completion: Arc<dyn CompletionClient>, retry: RetryPolicy, max_tokens: usize) -> Self {
        Self {
            completion,
            retry,
            max_tokens,
        }
    }

    /// Compose the report for the finished session.
    #[instrument(skip_all, fields(findings = findings.len()))]
    pub async fn synthesize(
        &self,
        original_query: &str,
        findings: &[Finding],
    ) -> Result<Report, ResearchError> {
        if findings.is_empty() {
            debug!("no findings, emitting inconclusive report");
            return Ok(inconclusive_report(original_query));
        }

        let prompt = build_prompt(original_query, findings);

        let body = self
            .retry
            .execute(|| async {
                let response = self
                    .completion
                    .complete(CompletionRequest {
                        prompt: prompt.clone(),
                        system: None,
                        max_tokens: self.max_tokens,
                        temperature: None,
                    })
                    .await
                    .map_err(|err| err.to_string())?;

                if response.text.trim().is_empty() {
                    return Err("empty synthesis response".to_string());
                }
                Ok(response.text)
            })
            .await
            .map_err(ResearchError::Synthesis)?;

        Ok(Report::from_body(&body, findings, false))
    }
}

fn build_prompt(original_query: &str, findings: &[Finding]) -> String {
    let mut prompt = format!(
        "Write a research report answering the question: \"{original_query}\".\n\n\
         Instructions:\n\
         - Base every statement on the numbered sources below; do not invent \
         information.\n\
         - Cite sources inline with bracketed numbers, e.g. [2]. Every factual \
         claim needs at least one citation.\n\
         - Be comprehensive but concise.\n\n\
         Sources:\n"
    );

    for (index, finding) in findings.iter().enumerate() {
        prompt.push_str(&format!(
            "[{}] {} ({})\nFound via: {}\n{}\n\n",
            index + 1,
            finding.title,
            finding.url,
            finding.query_text,
            finding.snippet
        ));
    }

    prompt
}

/// Fixed report for a session that exhausted its budget with no evidence.
pub fn inconclusive_report(original_query: &str) -> Report {
    Report {
        body: format!(
            "Research into \"{original_query}\" was inconclusive: no usable \
             sources were retrieved before the round budget was exhausted."
        ),
        citations: Vec::new(),
        degraded: true,
    }
}

/// Digest-only fallback report used when synthesis itself fails but
/// evidence exists: findings are listed verbatim with their markers so the
/// gathered sources are not lost.
pub fn degraded_digest_report(original_query: &str, findings: &[Finding]) -> Report {
    let mut body = format!(
        "Research into \"{original_query}\" gathered the sources below, but a \
         synthesized summary could not be produced.\n\n"
    );
    for (index, finding) in findings.iter().enumerate() {
        body.push_str(&format!(
            "[{}] {}: {}\n",
            index + 1,
            finding.title,
            finding.snippet
        ));
    }

    Report::from_body(&body, findings, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(url: &str, title: &str) -> Finding {
        Finding::new("q".into(), url, title.into(), format!("snippet for {title}"))
    }

    #[test]
    fn test_inconclusive_report_is_degraded_and_uncited() {
        let report = inconclusive_report("effects of caffeine on sleep");
        assert!(report.degraded);
        assert!(report.citations.is_empty());
        assert!(report.body.contains("inconclusive"));
    }

    #[test]
    fn test_degraded_digest_cites_every_finding() {
        let findings = vec![
            finding("https://a.example/1", "Alpha"),
            finding("https://b.example/2", "Beta"),
        ];
        let report = degraded_digest_report("q", &findings);

        assert!(report.degraded);
        assert_eq!(
            report.citations,
            vec!["https://a.example/1", "https://b.example/2"]
        );
        assert!(report.body.contains("[1] Alpha"));
        assert!(report.body.contains("[2] Beta"));
    }

    #[test]
    fn test_degraded_digest_idempotent() {
        let findings = vec![finding("https://a.example/1", "Alpha")];
        let first = degraded_digest_report("q", &findings);
        let second = degraded_digest_report("q", &findings);
        assert_eq!(first.citations, second.citations);
        assert_eq!(first.body, second.body);
    }
}
