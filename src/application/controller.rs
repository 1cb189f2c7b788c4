//! Loop controller: the state machine driving one research session.
//!
//! The controller owns the session record exclusively and is the sole
//! writer of `status` and `round`. Components are handed borrows and
//! return updates. Transitions follow a fixed topology:
//!
//! ```text
//! Planning -> Searching -> Reflecting -+-> Planning   (insufficient, budget left;
//! ^                                    |               round increments here)
//! +------------------------------------+
//!                                      +-> Finalizing (sufficient, or budget spent)
//! Finalizing -> Done
//! any active state -> Failed
//! ```
//!
//! Every transition emits exactly one event on the session's channel; the
//! terminal transition carries the report or the error record instead of
//! a bare status. Cancellation is cooperative: a flag checked at each
//! transition boundary, so in-flight calls finish and their results are
//! discarded with the session.

use tokio::sync::{mpsc, watch};
use tracing::{info, instrument, warn};

use crate::domain::errors::ResearchError;
use crate::domain::models::{ErrorRecord, ResearchSession, SessionEvent, SessionStatus};
use crate::services::{QueryPlanner, ReflectionEvaluator, ReportSynthesizer, SearchExecutor};
use crate::services::synthesizer::degraded_digest_report;

/// Drives one session from `Planning` to a terminal state.
pub struct LoopController {
    planner: QueryPlanner,
    executor: SearchExecutor,
    evaluator: ReflectionEvaluator,
    synthesizer: ReportSynthesizer,
    events: mpsc::Sender<SessionEvent>,
    cancel: watch::Receiver<bool>,
}

impl LoopController {
    pub fn new(
        planner: QueryPlanner,
        executor: SearchExecutor,
        evaluator: ReflectionEvaluator,
        synthesizer: ReportSynthesizer,
        events: mpsc::Sender<SessionEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            planner,
            executor,
            evaluator,
            synthesizer,
            events,
            cancel,
        }
    }

    /// Run the session to termination, returning its final state.
    #[instrument(skip_all, fields(session_id = %session.id))]
    pub async fn run(self, mut session: ResearchSession) -> ResearchSession {
        info!(
            query = %session.original_query,
            max_rounds = session.max_rounds,
            "research session started"
        );
        self.emit(SessionEvent::status_changed(&session)).await;

        // Queries planned for the round currently in flight.
        let mut planned: Vec<String> = Vec::new();

        while !session.is_terminal() {
            if self.cancelled() {
                self.fail(&mut session, ResearchError::Cancelled).await;
                break;
            }

            match session.status {
                SessionStatus::Planning => {
                    match self
                        .planner
                        .plan(&session.original_query, &session.gaps)
                        .await
                    {
                        Ok(queries) => {
                            planned = queries;
                            self.transition(&mut session, SessionStatus::Searching).await;
                        }
                        Err(err) => self.fail(&mut session, err).await,
                    }
                }

                SessionStatus::Searching => {
                    match self.executor.run_round(&planned, &session.findings).await {
                        Ok(outcome) => {
                            session.findings.extend(outcome.new_findings);
                            self.transition(&mut session, SessionStatus::Reflecting)
                                .await;
                        }
                        Err(err) => self.fail(&mut session, err).await,
                    }
                }

                SessionStatus::Reflecting => {
                    let reflection = self
                        .evaluator
                        .evaluate(&session.original_query, &session.findings, &session.gaps)
                        .await;
                    session.gaps = reflection.gaps;

                    if reflection.sufficient {
                        self.transition(&mut session, SessionStatus::Finalizing)
                            .await;
                    } else if session.budget_exhausted() {
                        warn!(
                            error = %ResearchError::BudgetExceeded(session.max_rounds),
                            "forcing finalization"
                        );
                        self.transition(&mut session, SessionStatus::Finalizing)
                            .await;
                    } else {
                        session.advance_round();
                        self.transition(&mut session, SessionStatus::Planning).await;
                    }
                }

                SessionStatus::Finalizing => {
                    match self
                        .synthesizer
                        .synthesize(&session.original_query, &session.findings)
                        .await
                    {
                        Ok(report) => {
                            session.transition(SessionStatus::Done);
                            self.emit(SessionEvent::Completed {
                                session_id: session.id,
                                report,
                            })
                            .await;
                        }
                        Err(err) if !session.findings.is_empty() => {
                            // Evidence exists; degrade instead of discarding it.
                            warn!(error = %err, "synthesis failed, emitting degraded digest");
                            let report = degraded_digest_report(
                                &session.original_query,
                                &session.findings,
                            );
                            session.transition(SessionStatus::Done);
                            self.emit(SessionEvent::Completed {
                                session_id: session.id,
                                report,
                            })
                            .await;
                        }
                        Err(err) => self.fail(&mut session, err).await,
                    }
                }

                SessionStatus::Done | SessionStatus::Failed => break,
            }
        }

        info!(status = session.status.as_str(), round = session.round, "session finished");
        session
    }

    fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    async fn transition(&self, session: &mut ResearchSession, status: SessionStatus) {
        session.transition(status);
        self.emit(SessionEvent::status_changed(session)).await;
    }

    async fn fail(&self, session: &mut ResearchSession, err: ResearchError) {
        warn!(error = %err, "session failed");
        let record = ErrorRecord::from(&err);
        session.fail(&err);
        self.emit(SessionEvent::Failed {
            session_id: session.id,
            error: record,
        })
        .await;
    }

    /// Event delivery is best-effort: a consumer that dropped its receiver
    /// forfeits the remaining events, but the session still runs to its
    /// terminal state.
    async fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event).await;
    }
}
