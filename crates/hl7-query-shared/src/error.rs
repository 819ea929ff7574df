//! Error types for shared access.

use hl7_location::LocationError;
use hl7_query::QueryError;
use thiserror::Error;

/// Errors that can occur while querying a shared structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Query error from the engine.
    #[error("Query error: {0}")]
    Query(QueryError),

    /// Descriptor parse error.
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] LocationError),
}

impl From<QueryError> for SharedError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Descriptor(err) => SharedError::Descriptor(err),
            err => SharedError::Query(err),
        }
    }
}

/// Result type for shared access operations.
pub type SharedResult<T> = std::result::Result<T, SharedError>;
