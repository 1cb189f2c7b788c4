use serde::{Deserialize, Serialize};

/// Main configuration structure for Magellan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Research loop configuration
    #[serde(default)]
    pub research: ResearchConfig,

    /// Completion service configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Search provider configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Research loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResearchConfig {
    /// Maximum Plan -> Search -> Reflect rounds before forced finalization
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Search queries generated per round (1-8)
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,

    /// Concurrent search calls within one round
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

const fn default_max_rounds() -> u32 {
    2
}

const fn default_fan_out() -> usize {
    3
}

const fn default_concurrency_limit() -> usize {
    4
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            fan_out: default_fan_out(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionConfig {
    /// API key (can also be set via MAGELLAN_COMPLETION__API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Base URL for the API (for testing/proxies)
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Request timeout in seconds
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

fn default_completion_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

fn default_completion_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

const fn default_max_tokens() -> usize {
    4096
}

const fn default_completion_timeout() -> u64 {
    120
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_completion_model(),
            base_url: default_completion_base_url(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_completion_timeout(),
        }
    }
}

/// Search provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// API key (can also be set via MAGELLAN_SEARCH__API_KEY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the search API
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Results requested per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".to_string()
}

const fn default_max_results() -> usize {
    5
}

const fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

/// Per-provider token bucket parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderRateLimit {
    /// Sustained requests per second (refill rate)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Burst capacity of the bucket
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    5.0
}

const fn default_burst_size() -> u32 {
    10
}

impl Default for ProviderRateLimit {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// Rate limiting configuration, one bucket per external provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Completion service bucket
    #[serde(default)]
    pub completion: ProviderRateLimit,

    /// Search provider bucket
    #[serde(default)]
    pub search: ProviderRateLimit,
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
