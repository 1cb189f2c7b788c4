use thiserror::Error;

/// Errors that can occur when talking to the search provider
#[derive(Error, Debug)]
pub enum SearchApiError {
    /// Invalid request parameters
    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    /// Authentication failed due to invalid or missing API key
    #[error("Search authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit exceeded, retry after waiting
    #[error("Search rate limit exceeded")]
    RateLimitExceeded,

    /// Provider encountered an internal error
    #[error("Search provider error: {0}")]
    ServerError(String),

    /// Network error occurred during request
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Request timed out waiting for response
    #[error("Timeout waiting for search response")]
    Timeout,

    /// Unknown error occurred
    #[error("Unknown search error: {0}")]
    Unknown(String),
}

impl SearchApiError {
    /// Returns true if this error is transient and should be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError(_) | Self::Timeout
        )
    }

    /// Create an error from an HTTP status code and response body.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 | 403 => Self::AuthenticationFailed(body),
            429 => Self::RateLimitExceeded,
            500..=599 => Self::ServerError(body),
            _ => Self::Unknown(format!("HTTP {status}: {body}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_transient_classification() {
        assert!(SearchApiError::RateLimitExceeded.is_transient());
        assert!(SearchApiError::ServerError("boom".into()).is_transient());
        assert!(SearchApiError::Timeout.is_transient());

        assert!(!SearchApiError::InvalidRequest("bad".into()).is_transient());
        assert!(!SearchApiError::AuthenticationFailed("key".into()).is_transient());
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            SearchApiError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            SearchApiError::RateLimitExceeded
        ));
        assert!(matches!(
            SearchApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            SearchApiError::ServerError(_)
        ));
        assert!(matches!(
            SearchApiError::from_status(StatusCode::FORBIDDEN, String::new()),
            SearchApiError::AuthenticationFailed(_)
        ));
    }
}
