//! # hl7-query-shared
//!
//! Concurrent read access to an HL7 v2.x [`Structure`](hl7_query::Structure)
//! and its query engine.
//!
//! The query engine itself assumes a single owner: an index rebuild must
//! not overlap a tree mutation or another query. [`SharedStructure`]
//! imposes that rule with one reader/writer lock around the structure and
//! index pair, so many threads can query while mutations stay exclusive.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use hl7_query::{Field, Segment, Structure};
//! use hl7_query_shared::SharedStructure;
//!
//! let obx = Segment::new("OBX").unwrap().with_field(Field::base("1"));
//! let shared = Arc::new(SharedStructure::new(Structure::from_segments(vec![obx])));
//!
//! let reader = {
//!     let shared = Arc::clone(&shared);
//!     thread::spawn(move || shared.has("OBX").unwrap())
//! };
//! assert!(reader.join().unwrap());
//!
//! println!("{}", shared.stats());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
mod shared;
mod types;

// Public re-exports
pub use error::{SharedError, SharedResult};
pub use shared::SharedStructure;
pub use types::SharedStats;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _: Option<SharedStats> = None;
        let _: Option<SharedResult<()>> = None;
        let _: Option<SharedStructure> = None;
    }

    #[test]
    fn test_shared_structure_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedStructure>();
    }
}
