//! Session store error types

use thiserror::Error;

/// Failure talking to one cache server
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Connection to {0} already closed")]
    Closed(String),

    #[error("Cache server {server} unreachable: {reason}")]
    Unreachable { server: String, reason: String },
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

/// Failure reading the session record table
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid session record on line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Session record source failed: {0}")]
    Source(String),
}

/// Per-operation session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("All {count} session servers failed")]
    AllServersFailed { count: usize },

    #[error("Session records unavailable: {0}")]
    RecordSource(#[from] RecordError),

    #[error("Session lock not acquired within {timeout_secs}s")]
    LockTimeout { timeout_secs: u64 },

    #[error("Session start failed: {0}")]
    Lifecycle(String),
}

/// Setup failures that keep the session layer from starting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("{0} must be specified in the session configuration")]
    MissingConfiguration(&'static str),

    #[error("Session handler problem: {0}")]
    ExtensionUnavailable(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
