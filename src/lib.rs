//! Magellan - Iterative Research Loop Orchestrator
//!
//! Magellan automates literature review: given a natural-language research
//! query it repeatedly plans searches, gathers and deduplicates evidence,
//! judges whether that evidence answers the query, and finally synthesizes
//! a cited report. The core is an explicit finite-state machine over one
//! mutable session record, driven through Plan -> Search -> Reflect rounds
//! until sufficiency or a round budget ends the loop.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): session state machine, findings, reports,
//!   and the collaborator port traits
//! - **Service Layer** (`services`): planner, search executor, reflection
//!   evaluator, report synthesizer
//! - **Application Layer** (`application`): the loop controller and the
//!   `submit_research` entry point
//! - **Infrastructure Layer** (`infrastructure`): HTTP adapters for the
//!   completion and search providers, configuration, rate limiting
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use magellan::application::ResearchOrchestrator;
//! use magellan::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = ResearchOrchestrator::from_config(ConfigLoader::load()?)?;
//!     let mut handle = orchestrator.submit_research("effects of caffeine on sleep");
//!     while let Some(event) = handle.events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{ResearchOrchestrator, SessionHandle, SessionOptions};
pub use domain::errors::{ResearchError, ResearchErrorKind};
pub use domain::models::{
    Config, ErrorRecord, Finding, Report, ResearchSession, SessionEvent, SessionStatus,
};
pub use domain::ports::{CompletionClient, SearchProvider};
pub use infrastructure::config::{ConfigError, ConfigLoader};
