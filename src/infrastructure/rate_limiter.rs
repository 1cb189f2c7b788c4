//! Token bucket rate limiter shared across research sessions.
//!
//! One bucket exists per external provider (completion, search),
//! constructed once per process and handed to the adapters as an `Arc`.
//! Tokens refill continuously based on elapsed time; `acquire` waits until
//! a token is available.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Token bucket rate limiter for API request throttling.
#[derive(Clone)]
pub struct TokenBucketRateLimiter {
    /// Current number of available tokens
    tokens: Arc<Mutex<f64>>,
    /// Maximum token capacity (burst tolerance)
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
    /// Last time tokens were refilled
    last_refill: Arc<Mutex<Instant>>,
}

impl TokenBucketRateLimiter {
    /// Create a limiter with burst capacity equal to the refill rate.
    pub fn new(requests_per_second: f64) -> Self {
        Self::with_burst(requests_per_second, requests_per_second)
    }

    /// Create a limiter with an explicit burst capacity.
    pub fn with_burst(requests_per_second: f64, burst: f64) -> Self {
        assert!(requests_per_second > 0.0, "requests_per_second must be positive");
        assert!(burst >= 1.0, "burst must allow at least one request");

        Self {
            tokens: Arc::new(Mutex::new(burst)),
            capacity: burst,
            refill_rate: requests_per_second,
            last_refill: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Acquire a token from the bucket, waiting if necessary.
    pub async fn acquire(&self) {
        loop {
            let mut tokens = self.tokens.lock().await;
            let mut last_refill = self.last_refill.lock().await;

            // Refill tokens based on elapsed time
            let now = Instant::now();
            let elapsed = now.duration_since(*last_refill).as_secs_f64();
            let new_tokens = (*tokens + elapsed * self.refill_rate).min(self.capacity);

            if new_tokens >= 1.0 {
                *tokens = new_tokens - 1.0;
                *last_refill = now;
                return;
            }

            // Not enough tokens; compute the wait for the next one
            let tokens_needed = 1.0 - new_tokens;
            let wait_secs = tokens_needed / self.refill_rate;
            let wait = Duration::from_secs_f64(wait_secs.max(0.01));

            // Release locks before sleeping
            drop(tokens);
            drop(last_refill);

            sleep(wait).await;
        }
    }

    /// Current number of available tokens (for testing/monitoring).
    pub async fn available_tokens(&self) -> f64 {
        let tokens = self.tokens.lock().await;
        let last_refill = self.last_refill.lock().await;

        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill).as_secs_f64();
        (*tokens + elapsed * self.refill_rate).min(self.capacity)
    }
}
