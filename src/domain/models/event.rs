//! Session-state events emitted over the research event stream.
//!
//! The stream mirrors the session state machine one-to-one: every
//! transition produces exactly one `StatusChanged`, and the stream
//! terminates with `Completed` or `Failed`. Consumers never observe a
//! state the machine did not pass through.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::models::report::Report;
use crate::domain::models::session::{ErrorRecord, ResearchSession, SessionStatus};

/// One event on a session's state stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The session entered a new status
    StatusChanged {
        session_id: Uuid,
        status: SessionStatus,
        round: u32,
        /// Unresolved knowledge gaps at the time of the transition
        gaps: Vec<String>,
        /// Findings gathered so far
        finding_count: usize,
    },

    /// Terminal: the session finished with a report
    Completed { session_id: Uuid, report: Report },

    /// Terminal: the session failed
    Failed {
        session_id: Uuid,
        error: ErrorRecord,
    },
}

impl SessionEvent {
    /// Snapshot a status transition from the current session state.
    pub fn status_changed(session: &ResearchSession) -> Self {
        Self::StatusChanged {
            session_id: session.id,
            status: session.status,
            round: session.round,
            gaps: session.gaps.clone(),
            finding_count: session.findings.len(),
        }
    }

    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_changed_snapshots_session() {
        let mut session = ResearchSession::new("q".into(), 2);
        session.gaps = vec!["long-term studies".into()];

        let event = SessionEvent::status_changed(&session);
        match event {
            SessionEvent::StatusChanged {
                session_id,
                status,
                round,
                gaps,
                finding_count,
            } => {
                assert_eq!(session_id, session.id);
                assert_eq!(status, SessionStatus::Planning);
                assert_eq!(round, 0);
                assert_eq!(gaps, vec!["long-term studies".to_string()]);
                assert_eq!(finding_count, 0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_terminal_classification() {
        let session = ResearchSession::new("q".into(), 2);
        assert!(!SessionEvent::status_changed(&session).is_terminal());
        assert!(SessionEvent::Completed {
            session_id: session.id,
            report: Report {
                body: String::new(),
                citations: vec![],
                degraded: true,
            },
        }
        .is_terminal());
    }
}
