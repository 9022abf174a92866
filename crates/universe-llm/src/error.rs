//! Error types for the LLM module

use thiserror::Error;

/// Result type alias for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// HTTP statuses worth retrying against the same model
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// LLM module errors
#[derive(Debug, Error)]
pub enum LLMError {
    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Provider answered 2xx but the body is not what we expected
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LLMError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LLMError::Status { status, .. } => Some(*status),
            LLMError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether another attempt against the same model may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LLMError::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            LLMError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status()
                        .is_some_and(|s| RETRYABLE_STATUSES.contains(&s.as_u16()))
            }
            _ => false,
        }
    }
}

impl From<String> for LLMError {
    fn from(s: String) -> Self {
        LLMError::Other(s)
    }
}

impl From<&str> for LLMError {
    fn from(s: &str) -> Self {
        LLMError::Other(s.to_string())
    }
}
