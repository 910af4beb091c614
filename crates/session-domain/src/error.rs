//! Connection-string parse errors

use thiserror::Error;

/// Reasons a single server segment is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid server URL '{segment}': {source}")]
    InvalidUrl {
        segment: String,
        source: url::ParseError,
    },

    #[error("server URL '{segment}' has no host")]
    MissingHost { segment: String },

    #[error("query pair '{pair}' in '{segment}' has no '='")]
    MalformedQueryPair { segment: String, pair: String },

    #[error("database '{value}' in '{segment}' is not an integer")]
    InvalidDatabase { segment: String, value: String },
}
