pub mod config;
pub mod event;
pub mod report;
pub mod session;

pub use config::{
    CompletionConfig, Config, LoggingConfig, ProviderRateLimit, RateLimitConfig, ResearchConfig,
    RetryConfig, SearchConfig,
};
pub use event::SessionEvent;
pub use report::Report;
pub use session::{canonical_source_id, ErrorRecord, Finding, ResearchSession, SessionStatus};
