//! Research session domain model.
//!
//! One `ResearchSession` tracks the lifetime state of a single research
//! request: the round counter, the status state machine, knowledge gaps,
//! and the deduplicated evidence gathered so far. The loop controller is
//! the sole writer; every other component reads a borrow and returns
//! updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{ResearchError, ResearchErrorKind};

/// Status of a research session in the loop pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Generating search queries for the current round
    #[default]
    Planning,
    /// Running the round's queries against the search provider
    Searching,
    /// Judging whether gathered evidence answers the query
    Reflecting,
    /// Synthesizing the cited report
    Finalizing,
    /// Report produced
    Done,
    /// Unrecoverable component error
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Searching => "searching",
            Self::Reflecting => "reflecting",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Valid transitions from this status.
    ///
    /// `Failed` is reachable from any non-terminal state and is therefore
    /// not listed per-edge here; `can_transition_to` special-cases it.
    pub fn valid_transitions(&self) -> Vec<SessionStatus> {
        match self {
            Self::Planning => vec![Self::Searching],
            Self::Searching => vec![Self::Reflecting],
            Self::Reflecting => vec![Self::Planning, Self::Finalizing],
            Self::Finalizing => vec![Self::Done],
            Self::Done | Self::Failed => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        if new_status == Self::Failed {
            return !self.is_terminal();
        }
        self.valid_transitions().contains(&new_status)
    }
}

/// One deduplicated piece of retrieved evidence tied to a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable identity derived from the originating URL; unique within a
    /// session's findings
    pub source_id: String,

    /// The search query that produced this finding
    pub query_text: String,

    /// Source title as returned by the provider
    pub title: String,

    /// Original locator
    pub url: String,

    /// Retrieved text excerpt
    pub snippet: String,

    /// When the finding was retrieved
    pub retrieved_at: DateTime<Utc>,
}

impl Finding {
    /// Build a finding from a raw search hit, deriving the canonical
    /// `source_id` from the locator.
    pub fn new(query_text: String, url: &str, title: String, snippet: String) -> Self {
        Self {
            source_id: canonical_source_id(url),
            query_text,
            title,
            url: url.to_string(),
            snippet,
            retrieved_at: Utc::now(),
        }
    }
}

/// Derive a stable source identity from a URL.
///
/// Scheme and host are lowercased, the fragment is dropped, and a trailing
/// slash is trimmed, so `HTTPS://Example.org/a/` and
/// `https://example.org/a#intro` identify the same source.
pub fn canonical_source_id(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = match trimmed.split_once('#') {
        Some((head, _)) => head,
        None => trimmed,
    };

    let lowered = match without_fragment.split_once("://") {
        Some((scheme, rest)) => {
            let (authority, path) = match rest.split_once('/') {
                Some((authority, path)) => (authority, Some(path)),
                None => (rest, None),
            };
            match path {
                Some(path) => format!(
                    "{}://{}/{}",
                    scheme.to_ascii_lowercase(),
                    authority.to_ascii_lowercase(),
                    path
                ),
                None => format!(
                    "{}://{}",
                    scheme.to_ascii_lowercase(),
                    authority.to_ascii_lowercase()
                ),
            }
        }
        None => without_fragment.to_string(),
    };

    lowered.trim_end_matches('/').to_string()
}

/// Error record attached to a session on transition into `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: ResearchErrorKind,
    pub message: String,
}

impl From<&ResearchError> for ErrorRecord {
    fn from(err: &ResearchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// One research request's lifetime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSession {
    /// Unique session identifier
    pub id: Uuid,

    /// Immutable input query
    pub original_query: String,

    /// Completed Plan -> Search -> Reflect cycles; bounded by `max_rounds`
    pub round: u32,

    /// Configured round budget
    pub max_rounds: u32,

    /// Current pipeline status
    pub status: SessionStatus,

    /// Knowledge gaps driving the next round's queries; replaced each round
    pub gaps: Vec<String>,

    /// Deduplicated evidence, append-only
    pub findings: Vec<Finding>,

    /// Set only on transition into `Failed`
    pub last_error: Option<ErrorRecord>,

    /// Session creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResearchSession {
    pub fn new(original_query: String, max_rounds: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            original_query,
            round: 0,
            max_rounds,
            status: SessionStatus::Planning,
            gaps: Vec::new(),
            findings: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the session to `status`, panicking in debug builds on an edge
    /// the state machine does not define.
    pub fn transition(&mut self, status: SessionStatus) {
        debug_assert!(
            self.status.can_transition_to(status),
            "invalid transition {} -> {}",
            self.status.as_str(),
            status.as_str()
        );
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Increment the round counter on the Reflecting -> Planning edge.
    pub fn advance_round(&mut self) {
        debug_assert!(self.round < self.max_rounds);
        self.round += 1;
        self.updated_at = Utc::now();
    }

    /// Whether the round budget is exhausted.
    pub fn budget_exhausted(&self) -> bool {
        self.round >= self.max_rounds
    }

    /// Record a fatal error and move to `Failed`.
    pub fn fail(&mut self, err: &ResearchError) {
        self.last_error = Some(ErrorRecord::from(err));
        self.transition(SessionStatus::Failed);
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
