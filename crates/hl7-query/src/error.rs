//! Error types for querying a message structure.

use std::fmt;

use hl7_location::{LocationError, LocationKey};
use thiserror::Error;

/// A level of the message tree, used to report where a lookup ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Segment slot or occurrence.
    Segment,
    /// Field position within a segment.
    Field,
    /// Repetition within a field position.
    Repetition,
    /// Component within a field.
    Component,
    /// Subcomponent within a component.
    Subcomponent,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Segment => "segment",
            Level::Field => "field",
            Level::Repetition => "repetition",
            Level::Component => "component",
            Level::Subcomponent => "subcomponent",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while building or querying a structure.
///
/// Only [`Descriptor`](QueryError::Descriptor) and
/// [`InvalidSetting`](QueryError::InvalidSetting) escape the
/// policy-driven operations (`get`, `get_all`, `has`). The lookup failures
/// are surfaced by the strict `resolve` operation and by tree mutators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The location descriptor could not be parsed.
    #[error("Malformed descriptor: {0}")]
    Descriptor(#[from] LocationError),

    /// Nothing exists at the addressed location.
    #[error("Nothing found at {0}")]
    NotFound(LocationKey),

    /// An explicit index exceeds the number of children at that level.
    #[error("{level} index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// Level at which the index was applied.
        level: Level,
        /// The requested index.
        index: usize,
        /// Number of children actually present.
        len: usize,
    },

    /// A settings identifier or value was not recognized.
    #[error("Invalid setting '{name}': {reason}")]
    InvalidSetting {
        /// The identifier as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A segment was constructed without a name.
    #[error("Segment name must not be empty")]
    EmptySegmentName,
}

/// Result type for query operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;
