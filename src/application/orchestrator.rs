//! Research orchestrator: process-level wiring and the public entry point.
//!
//! The orchestrator is constructed once per process. It holds the shared
//! collaborator ports and the configuration; each submitted query gets
//! its own session task, its own event channel, and its own cancellation
//! flag. Independent sessions share no mutable state beyond the token
//! buckets living inside the provider adapters.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::controller::LoopController;
use crate::domain::models::{Config, ResearchSession, SessionEvent};
use crate::domain::ports::completion::CompletionClient;
use crate::domain::ports::search::SearchProvider;
use crate::infrastructure::completion::HttpCompletionClient;
use crate::infrastructure::rate_limiter::TokenBucketRateLimiter;
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::search::HttpSearchProvider;
use crate::services::{QueryPlanner, ReflectionEvaluator, ReportSynthesizer, SearchExecutor};

/// Event channel depth per session; the controller awaits on a full
/// channel rather than dropping events.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Per-session knobs, defaulted from the loaded configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Round budget for this session
    pub max_rounds: u32,
    /// Queries planned per round
    pub fan_out: usize,
    /// Concurrent search calls within one round
    pub concurrency_limit: usize,
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_rounds: config.research.max_rounds,
            fan_out: config.research.fan_out,
            concurrency_limit: config.research.concurrency_limit,
        }
    }
}

/// A running session: its event stream and cancellation handle.
pub struct SessionHandle {
    /// Session identifier, stable across all emitted events
    pub session_id: Uuid,

    /// Ordered, finite event sequence terminating with `Completed` or
    /// `Failed`
    pub events: mpsc::Receiver<SessionEvent>,

    /// Resolves to the final session state once the loop terminates
    pub task: JoinHandle<ResearchSession>,

    cancel: watch::Sender<bool>,
}

impl SessionHandle {
    /// Request cooperative cancellation. The controller observes the flag
    /// at its next state transition boundary; in-flight provider calls
    /// complete and are discarded.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

/// Entry point for submitting research queries.
pub struct ResearchOrchestrator {
    completion: Arc<dyn CompletionClient>,
    search: Arc<dyn SearchProvider>,
    config: Config,
}

impl ResearchOrchestrator {
    /// Wire an orchestrator over explicit collaborator ports.
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        search: Arc<dyn SearchProvider>,
        config: Config,
    ) -> Self {
        Self {
            completion,
            search,
            config,
        }
    }

    /// Wire an orchestrator with the HTTP adapters, building one token
    /// bucket per provider for the life of the process.
    pub fn from_config(config: Config) -> Result<Self> {
        let completion_limiter = Arc::new(TokenBucketRateLimiter::with_burst(
            config.rate_limit.completion.requests_per_second,
            f64::from(config.rate_limit.completion.burst_size),
        ));
        let search_limiter = Arc::new(TokenBucketRateLimiter::with_burst(
            config.rate_limit.search.requests_per_second,
            f64::from(config.rate_limit.search.burst_size),
        ));

        let completion = Arc::new(HttpCompletionClient::new(
            &config.completion,
            &config.retry,
            completion_limiter,
        )?);
        let search = Arc::new(HttpSearchProvider::new(
            &config.search,
            &config.retry,
            search_limiter,
        )?);

        Ok(Self::new(completion, search, config))
    }

    /// Submit a research query with configuration defaults.
    pub fn submit_research(&self, query: impl Into<String>) -> SessionHandle {
        self.submit_research_with(query, SessionOptions::from(&self.config))
    }

    /// Submit a research query with explicit per-session options.
    ///
    /// Returns immediately; the session runs on its own task and reports
    /// through the handle's event receiver.
    pub fn submit_research_with(
        &self,
        query: impl Into<String>,
        options: SessionOptions,
    ) -> SessionHandle {
        let session = ResearchSession::new(query.into(), options.max_rounds);
        let session_id = session.id;

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let retry = RetryPolicy::from_config(&self.config.retry);
        let max_tokens = self.config.completion.max_tokens;

        let controller = LoopController::new(
            QueryPlanner::new(
                Arc::clone(&self.completion),
                retry.clone(),
                options.fan_out,
                max_tokens,
            ),
            SearchExecutor::new(Arc::clone(&self.search), options.concurrency_limit),
            ReflectionEvaluator::new(Arc::clone(&self.completion), retry.clone(), max_tokens),
            ReportSynthesizer::new(Arc::clone(&self.completion), retry, max_tokens),
            events_tx,
            cancel_rx,
        );

        let task = tokio::spawn(controller.run(session));

        SessionHandle {
            session_id,
            events: events_rx,
            task,
            cancel: cancel_tx,
        }
    }
}
