//! # hl7-location
//!
//! Location keys and the descriptor grammar for addressing nodes inside a
//! parsed HL7 v2.x message.
//!
//! A message is a tree: segments own repeating fields, a repeating field
//! owns its repetitions, and each repetition may split into components and
//! subcomponents. A [`LocationKey`] names a coordinate in that tree, and
//! any of its indices may be left unspecified to act as a wildcard.
//!
//! ## Usage
//!
//! ```rust
//! use hl7_location::{parse, LocationKey};
//!
//! // First component of field 3 of any PID segment
//! let query = parse("PID-3.1").unwrap();
//!
//! // A leaf as recorded by an index
//! let leaf = LocationKey::canonical("PID", 0, 3, 0, Some(0), None);
//! assert!(leaf.matches(&query));
//! ```
//!
//! ## Descriptor Syntax Quick Reference
//!
//! | Descriptor | Meaning |
//! |------------|---------|
//! | `PID` | Every PID segment |
//! | `PID[1]` | Second PID segment (0-based) |
//! | `PID-3` | Field 3, any repetition |
//! | `OBX-5(2)` | Third repetition of field 5 (0-based) |
//! | `PID-3.1` | First component of field 3 (1-based) |
//! | `OBX-5.2.1` | First subcomponent of the second component |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod key;
mod parser;

pub use error::{LocationError, LocationResult};
pub use key::{Depth, LocationKey};
pub use parser::parse;
