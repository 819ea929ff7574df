//! Error types for descriptor parsing.

use thiserror::Error;

/// Errors that can occur while parsing a location descriptor.
///
/// Every variant means the text does not conform to the descriptor
/// grammar. Parsing never returns a partially built key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// Parse error at a specific position in the input.
    #[error("malformed descriptor at position {position}: {message}")]
    Malformed {
        /// Position in the input where the error occurred.
        position: usize,
        /// Description of the error.
        message: String,
    },

    /// Empty input provided.
    #[error("empty location descriptor")]
    EmptyDescriptor,

    /// Segment name is missing or shorter than three characters.
    #[error("invalid segment name: '{0}'")]
    InvalidSegmentName(String),

    /// A numeric index does not fit in a machine word.
    #[error("index out of bounds for this platform: {0}")]
    IndexOverflow(String),
}

/// Result type for descriptor parsing.
pub type LocationResult<T> = std::result::Result<T, LocationError>;
