//! Terminal report artifact.
//!
//! A report body references findings through numeric in-text markers like
//! `[2]`, keyed to the numbered source digest the synthesizer hands the
//! completion service. Citation bookkeeping is deterministic
//! post-processing over that body: markers resolve to source ids, the
//! citation list is built in first-use order, and markers that resolve to
//! nothing are stripped so the published body never dangles.

use serde::{Deserialize, Serialize};

use crate::domain::models::session::Finding;

/// Synthesized research report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report text with `[n]` in-text markers
    pub body: String,

    /// Source ids referenced by the body, in first-use order
    pub citations: Vec<String>,

    /// True when produced without sufficient evidence (zero findings, or
    /// the degraded fallback after a synthesis failure)
    pub degraded: bool,
}

impl Report {
    /// Build a report from a synthesized body and the frozen findings the
    /// digest was numbered from.
    ///
    /// Markers are 1-based digest indices. Markers outside `1..=findings.len()`
    /// are removed from the body. Citations contain exactly the source ids
    /// the surviving markers reference, ordered by first use.
    pub fn from_body(body: &str, findings: &[Finding], degraded: bool) -> Self {
        let mut cleaned = String::with_capacity(body.len());
        let mut citations: Vec<String> = Vec::new();

        let mut rest = body;
        while let Some(open) = rest.find('[') {
            cleaned.push_str(&rest[..open]);
            let tail = &rest[open + 1..];

            match parse_marker(tail) {
                Some((index, consumed)) => {
                    if index >= 1 && index <= findings.len() {
                        let source_id = &findings[index - 1].source_id;
                        if !citations.iter().any(|c| c == source_id) {
                            citations.push(source_id.clone());
                        }
                        cleaned.push('[');
                        cleaned.push_str(&tail[..consumed]);
                        cleaned.push(']');
                    }
                    // Unresolvable markers are dropped entirely
                    rest = &tail[consumed + 1..];
                }
                None => {
                    cleaned.push('[');
                    rest = tail;
                }
            }
        }
        cleaned.push_str(rest);

        Self {
            body: cleaned,
            citations,
            degraded,
        }
    }
}

/// Parse a `digits]` head; returns the marker value and the digit count.
fn parse_marker(tail: &str) -> Option<(usize, usize)> {
    let digits: usize = tail.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || tail.as_bytes().get(digits) != Some(&b']') {
        return None;
    }
    tail[..digits].parse().ok().map(|value| (value, digits))
}
