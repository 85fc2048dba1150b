//! Unified error types for justsearch.
//!
//! Every variant carries a stable tag in its display text so hosts can
//! match on it without depending on this enum.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the justsearch crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Nothing cached under the requested key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Persisted data could not be decoded.
    #[error("STORAGE_CORRUPT: {0}")]
    StorageCorrupt(String),

    /// Navigation target is not an http(s) URL.
    #[error("UNSAFE_TARGET: {0}")]
    UnsafeTarget(String),

    /// Remote call did not complete in time.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Remote call failed at the transport level.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// An asset listed in the worker manifest could not be fetched.
    #[error("ASSET_FETCH_FAILED: {url}: {reason}")]
    AssetFetchFailed { url: String, reason: String },
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::StorageCorrupt(msg) => (-32003, msg.clone()),
            Error::UnsafeTarget(msg) => (-32004, msg.clone()),
            Error::FetchTimeout(msg) => (-32006, msg.clone()),
            Error::Network(msg) => (-32008, msg.clone()),
            Error::AssetFetchFailed { .. } => (-32013, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("justsearch:last-results".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("justsearch:last-results"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("query cannot be empty".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_asset_fetch_failed_message() {
        let err = Error::AssetFetchFailed { url: "http://localhost:8080/app.js".into(), reason: "404".into() };
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32013);
        assert!(mcp_err.message.contains("app.js"));
    }
}
