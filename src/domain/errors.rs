//! Domain errors for the research loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced to the loop controller by the research components.
///
/// Component-internal retries happen before any of these are constructed:
/// a `ResearchError` means the owning component already exhausted its retry
/// budget, or observed something unretryable.
#[derive(Error, Debug)]
pub enum ResearchError {
    /// Query planner exhausted its retries without a usable query list
    #[error("query planning failed: {0}")]
    Planning(String),

    /// Every search query in a round failed
    #[error("search provider failed for all queries in the round: {0}")]
    SearchProvider(String),

    /// Report synthesizer exhausted its retries
    #[error("report synthesis failed: {0}")]
    Synthesis(String),

    /// Round budget exhausted. Informational: forces finalization, never
    /// fails the session.
    #[error("round budget of {0} exhausted without a sufficiency verdict")]
    BudgetExceeded(u32),

    /// External cancellation observed at a state transition boundary
    #[error("research session cancelled")]
    Cancelled,
}

/// Discriminant of a `ResearchError`, carried on terminal session records
/// and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchErrorKind {
    Planning,
    SearchProvider,
    Synthesis,
    BudgetExceeded,
    Cancelled,
}

impl ResearchError {
    pub fn kind(&self) -> ResearchErrorKind {
        match self {
            Self::Planning(_) => ResearchErrorKind::Planning,
            Self::SearchProvider(_) => ResearchErrorKind::SearchProvider,
            Self::Synthesis(_) => ResearchErrorKind::Synthesis,
            Self::BudgetExceeded(_) => ResearchErrorKind::BudgetExceeded,
            Self::Cancelled => ResearchErrorKind::Cancelled,
        }
    }

    /// Whether this error moves a session to `Failed`.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::BudgetExceeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_exceeded_is_not_fatal() {
        assert!(!ResearchError::BudgetExceeded(3).is_fatal());
    }

    #[test]
    fn test_other_kinds_are_fatal() {
        assert!(ResearchError::Planning("no queries".into()).is_fatal());
        assert!(ResearchError::SearchProvider("all failed".into()).is_fatal());
        assert!(ResearchError::Synthesis("timed out".into()).is_fatal());
        assert!(ResearchError::Cancelled.is_fatal());
    }

    #[test]
    fn test_kind_discriminants() {
        assert_eq!(
            ResearchError::Planning(String::new()).kind(),
            ResearchErrorKind::Planning
        );
        assert_eq!(ResearchError::Cancelled.kind(), ResearchErrorKind::Cancelled);
    }
}
