//! # hl7-query
//!
//! Field tree, structure index and query engine for HL7 v2.x messages.
//!
//! An upstream tokenizer turns a message into a [`Structure`]; this crate
//! addresses and queries it. Locations are written as descriptors such as
//! `PID-3.1` (see [`hl7_location`]) and resolved either by walking the
//! tree or by scanning a flattened [`StructureIndex`] of its leaves.
//!
//! ## Key Features
//!
//! - **Wildcard addressing** - omitted indices match every occurrence
//! - **One engine, two strategies** - indexed scan or direct walk, same answers
//! - **Lazy index upkeep** - tree mutation marks the structure dirty, the next
//!   indexed query rebuilds
//! - **Fallback policies** - never-return-null and roll-up-dot-one
//!
//! ## Quick Start
//!
//! ```rust
//! use hl7_query::{Field, QueryEngine, Segment, Structure};
//!
//! let pid = Segment::new("PID")
//!     .unwrap()
//!     .with_field(Field::base("1"))
//!     .with_field(Field::base(""))
//!     .with_field(Field::from_texts(["12345", "DOE", "JOHN"]))
//!     .with_field(Field::base(""))
//!     .with_field(Field::base("SMITH"));
//! let mut structure = Structure::from_segments(vec![pid]);
//! let mut engine = QueryEngine::new(&mut structure);
//!
//! // Component 1 of field 3
//! assert_eq!(engine.get("PID-3.1").unwrap().unwrap().data(), Some("12345"));
//!
//! // Whole composite field
//! assert_eq!(engine.get("PID-3").unwrap().unwrap().to_string(), "12345^DOE^JOHN");
//!
//! // PID-5 has no components, so PID-5.1 rolls up to the field itself
//! assert_eq!(engine.get("PID-5.1").unwrap().unwrap().data(), Some("SMITH"));
//!
//! // Missing data yields the empty sentinel, not None
//! assert!(engine.get("ZZZ-1").unwrap().unwrap().is_empty_sentinel());
//! ```
//!
//! ## With Configuration
//!
//! ```rust
//! use hl7_query::{CacheConfig, QueryConfig, QueryEngine, Strategy, Structure};
//!
//! let config = QueryConfig::builder()
//!     .with_never_return_null(false)
//!     .with_roll_up_dot_one(true)
//!     .with_strategy(Strategy::Indexed)
//!     .with_descriptor_cache(CacheConfig { max_entries: 256 })
//!     .build();
//!
//! let mut engine = QueryEngine::with_config(Structure::new(), config);
//! assert!(engine.get("PID-3").unwrap().is_none());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/Deserialize for keys, strategies and statistics
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          hl7-query                           │
//! │                                                              │
//! │  QueryEngine / QueryView                                     │
//! │  ├── descriptor → LocationKey (hl7-location, cached)         │
//! │  ├── Indexed: scan StructureIndex, project to query depth    │
//! │  ├── DirectWalk: descend Structure with bounds checks        │
//! │  └── apply never-return-null / roll-up-dot-one               │
//! │                                                              │
//! │  Structure ─ Segment ─ RepeatingField ─ Field                │
//! │            ─ FieldComponent ─ FieldSubcomponent              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod engine;
mod error;
mod index;
mod node;
mod result;
mod traits;
mod tree;
mod walk;

// Public re-exports
pub use cache::{normalize_descriptor, CacheStats, DescriptorCache};
pub use config::{CacheConfig, QueryConfig, QueryConfigBuilder, Setting, Strategy};
pub use engine::{QueryEngine, QueryView};
pub use error::{Level, QueryError, QueryResult};
pub use index::{IndexEntry, IndexStats, StructureIndex};
pub use node::{EmptyField, Node, NodePath};
pub use traits::{DataField, ToLocationKey};
pub use tree::{
    Field, FieldComponent, FieldSubcomponent, RepeatingField, Segment, Structure,
    COMPONENT_SEPARATOR, REPETITION_SEPARATOR, SUBCOMPONENT_SEPARATOR,
};

// Re-export commonly used types from hl7-location for convenience
pub use hl7_location::{parse, Depth, LocationError, LocationKey};
