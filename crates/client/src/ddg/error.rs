//! Instant-answer client error types.

use std::sync::Arc;

/// Errors from one remote instant-answer lookup.
///
/// Every variant is recoverable: the search orchestrator falls back to the
/// persisted snapshot on any of them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The request did not complete before the deadline and was cancelled.
    #[error("request timed out")]
    Timeout,

    /// The request could not be completed at all.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// The API answered with a non-success status.
    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },

    /// The response body was not JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether the failure came from the deadline rather than the transport.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Network(Arc::new(err)) }
    }
}

impl From<FetchError> for justsearch_core::Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => justsearch_core::Error::FetchTimeout(err.to_string()),
            _ => justsearch_core::Error::Network(err.to_string()),
        }
    }
}
