//! Result and error types for domquery-selectors.

use domquery::QueryError;
use thiserror::Error;

/// Result type for selector operations
pub type SelectorResult<T> = Result<T, SelectorError>;

/// Errors returned by selector operations
#[derive(Debug, Error)]
pub enum SelectorError {
    /// Error raised by the query provider, message unchanged
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The dispatch table is incomplete or a binding has the wrong shape
    #[error("Dispatch of {query} failed: {reason}")]
    Dispatch {
        /// Query identifier, e.g. `findByRole`
        query: String,
        /// What went wrong
        reason: String,
    },
}

impl SelectorError {
    /// The provider error, if this is one
    #[must_use]
    pub const fn as_query(&self) -> Option<&QueryError> {
        match self {
            Self::Query(err) => Some(err),
            Self::Dispatch { .. } => None,
        }
    }

    /// Provider reported zero matches (or timed out waiting for one)
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Query(err) => err.is_not_found(),
            Self::Dispatch { .. } => false,
        }
    }

    pub(crate) fn dispatch(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dispatch {
            query: query.into(),
            reason: reason.into(),
        }
    }
}
