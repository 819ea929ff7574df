//! Per-branch resolution outcomes.
//!
//! A query that fans out over several segments or repetitions resolves
//! each branch independently. A failed branch is a value, not an error, so
//! plural queries simply skip it while singular queries can still report
//! why nothing was found.

use hl7_location::LocationKey;

use crate::error::{Level, QueryError};
use crate::node::NodePath;

/// Why one branch of a lookup produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Miss {
    /// No node exists at the coordinates (missing segment, or a component
    /// requested from a base value).
    NotFound,
    /// An explicit index ran past the children present at `level`.
    OutOfRange {
        level: Level,
        index: usize,
        len: usize,
    },
}

impl Miss {
    pub(crate) fn out_of_range(level: Level, index: usize, len: usize) -> Self {
        Miss::OutOfRange { level, index, len }
    }

    /// Converts the miss into the error reported by strict lookups.
    pub(crate) fn into_error(self, key: &LocationKey) -> QueryError {
        match self {
            Miss::NotFound => QueryError::NotFound(key.clone()),
            Miss::OutOfRange { level, index, len } => {
                QueryError::IndexOutOfRange { level, index, len }
            }
        }
    }
}

/// Outcome of resolving one branch.
pub(crate) type Branch = Result<NodePath, Miss>;

/// Picks the singular answer from branches in document order: the first
/// hit, or else the first miss.
pub(crate) fn first(branches: Vec<Branch>) -> Branch {
    let mut first_miss = None;
    for branch in branches {
        match branch {
            Ok(path) => return Ok(path),
            Err(miss) => {
                first_miss.get_or_insert(miss);
            }
        }
    }
    Err(first_miss.unwrap_or(Miss::NotFound))
}
