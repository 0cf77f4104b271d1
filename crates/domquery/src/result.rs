//! Result and error types for domquery.

use thiserror::Error;

use crate::queries::QueryKind;

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while querying or building a document
#[derive(Debug, Error)]
pub enum QueryError {
    /// A single-required lookup found zero matches
    #[error("{message}")]
    NotFound {
        /// Query strategy that failed
        kind: QueryKind,
        /// Rendered matcher
        matcher: String,
        /// Full message, including the DOM snapshot when enabled
        message: String,
    },

    /// A single-cardinality lookup found more than one match
    #[error("{message}")]
    MultipleMatches {
        /// Query strategy that failed
        kind: QueryKind,
        /// Rendered matcher
        matcher: String,
        /// Number of elements found
        count: usize,
        /// Full message, including the DOM snapshot when enabled
        message: String,
    },

    /// An asynchronous lookup ran out of time
    #[error("Timed out after {ms}ms: {message}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Message of the last failed attempt
        message: String,
    },

    /// No page document is mounted on this thread
    #[error("No page document is mounted; call render() or mount() first")]
    NoPage,

    /// Malformed fixture HTML
    #[error("HTML parse error at byte {offset}: {message}")]
    Html {
        /// Byte offset into the source
        offset: usize,
        /// Error message
        message: String,
    },

    /// Unsupported or malformed selector
    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        /// The selector text
        selector: String,
        /// Error message
        message: String,
    },

    /// Invalid DOM mutation
    #[error("DOM error: {message}")]
    Dom {
        /// Error message
        message: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid regular expression matcher
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl QueryError {
    /// Whether a wait loop should keep polling after this error
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::MultipleMatches { .. })
    }

    /// Whether the lookup matched nothing (synchronously or after waiting)
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        let not_found = QueryError::NotFound {
            kind: QueryKind::Text,
            matcher: "Missing".to_string(),
            message: "Unable to find an element with the text: Missing".to_string(),
        };
        assert!(not_found.is_retryable());
        assert!(not_found.is_not_found());
        assert!(!QueryError::NoPage.is_retryable());
    }

    #[test]
    fn test_timeout_display() {
        let err = QueryError::Timeout {
            ms: 10,
            message: "Unable to find an element by: [data-testid=\"late\"]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 10ms: Unable to find an element by: [data-testid=\"late\"]"
        );
    }
}
