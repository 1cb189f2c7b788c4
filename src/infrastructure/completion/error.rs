use thiserror::Error;

/// Errors that can occur when talking to the completion service
#[derive(Error, Debug)]
pub enum CompletionApiError {
    /// Invalid request parameters or malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded, retry after waiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// API server encountered an internal error
    #[error("API server error: {0}")]
    ServerError(String),

    /// API server is overloaded, retry later
    #[error("API server overloaded")]
    Overloaded,

    /// Network error occurred during request
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error
    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out waiting for response
    #[error("Timeout waiting for response")]
    Timeout,

    /// Unknown error occurred
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl CompletionApiError {
    /// Returns true if this error is transient and should be retried.
    ///
    /// Transient: rate limit, server errors, overload, timeout. Permanent:
    /// invalid request, auth failure, serialization, unknown.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_) | Self::Overloaded | Self::Timeout
        )
    }

    /// Create an error from an HTTP status code and response body.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded,
            529 => Self::Overloaded,
            500..=599 => Self::ServerError(body),
            _ => Self::Unknown(format!("HTTP {status}: {body}")),
        }
    }
}
