//! The structure index: a flattened, document-ordered map of every leaf.
//!
//! Building walks the tree once, giving each leaf (base field, base
//! component or subcomponent) a canonical [`LocationKey`]. Queries then
//! scan the entries with [`LocationKey::matches`] instead of descending
//! the tree. The index is a snapshot; it is rebuilt wholesale, never
//! patched.

use std::time::Duration;

use hashbrown::HashMap;
use hl7_location::{Depth, LocationKey};

use crate::node::NodePath;
use crate::tree::{Field, Structure};

/// One indexed leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    key: LocationKey,
    path: NodePath,
}

impl IndexEntry {
    /// Returns the canonical key of the leaf.
    pub fn key(&self) -> &LocationKey {
        &self.key
    }

    /// Returns the positional path of the leaf.
    pub fn path(&self) -> NodePath {
        self.path
    }
}

/// Flattened leaf index over one [`Structure`].
///
/// # Example
///
/// ```rust
/// use hl7_query::{Field, LocationKey, Segment, Structure, StructureIndex};
///
/// let pid = Segment::new("PID")
///     .unwrap()
///     .with_field(Field::base("1"))
///     .with_field(Field::from_texts(["DOE", "JOHN"]));
/// let structure = Structure::from_segments(vec![pid]);
///
/// let index = StructureIndex::build(&structure);
/// // identifier, PID-1, two components of PID-2
/// assert_eq!(index.len(), 4);
///
/// let query: LocationKey = "PID-2".parse().unwrap();
/// assert_eq!(index.matching(&query).count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureIndex {
    entries: Vec<IndexEntry>,
    lookup: HashMap<LocationKey, usize>,
    segments: usize,
}

impl StructureIndex {
    /// Flattens `structure` into a new index.
    ///
    /// Segment occurrences are counted per name, ignoring case, in
    /// document order. Entries are recorded in traversal order, which is
    /// document order.
    pub fn build(structure: &Structure) -> Self {
        let mut index = Self {
            entries: Vec::with_capacity(structure.leaf_count()),
            lookup: HashMap::new(),
            segments: structure.len(),
        };
        let mut occurrences: HashMap<String, usize> = HashMap::new();

        for (slot, segment) in structure.segments().iter().enumerate() {
            let name = segment.name().to_ascii_uppercase();
            let counter = occurrences.entry(name.clone()).or_insert(0);
            let occurrence = *counter;
            *counter += 1;

            for (position, repeating) in segment.fields().iter().enumerate() {
                for (repetition, field) in repeating.fields().iter().enumerate() {
                    let leaf = Leaf {
                        name: &name,
                        occurrence,
                        path: NodePath::field(slot, position, repetition),
                    };
                    index.record_field(&leaf, field);
                }
            }
        }

        index.lookup.reserve(index.entries.len());
        for (i, entry) in index.entries.iter().enumerate() {
            index.lookup.insert(entry.key.clone(), i);
        }
        index
    }

    fn record_field(&mut self, leaf: &Leaf<'_>, field: &Field) {
        if field.is_base() {
            self.push(leaf, leaf.path);
            return;
        }
        for (c, component) in field.components().iter().enumerate() {
            let path = leaf.path.with_component(c);
            if component.is_base() {
                self.push(leaf, path);
                continue;
            }
            for s in 0..component.subcomponents().len() {
                self.push(leaf, path.with_subcomponent(s));
            }
        }
    }

    fn push(&mut self, leaf: &Leaf<'_>, path: NodePath) {
        let key = LocationKey::canonical(
            leaf.name,
            leaf.occurrence,
            path.field,
            path.repetition,
            path.component,
            path.subcomponent,
        );
        self.entries.push(IndexEntry { key, path });
    }

    /// Returns every entry in document order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Returns the number of indexed leaves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no leaves were indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of segments the index was built from.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Looks up the leaf recorded under an exact canonical key.
    pub fn get(&self, key: &LocationKey) -> Option<&IndexEntry> {
        self.lookup.get(key).map(|&i| &self.entries[i])
    }

    /// Returns the entries whose canonical key satisfies `query`, in
    /// document order.
    pub fn matching<'a>(&'a self, query: &'a LocationKey) -> impl Iterator<Item = &'a IndexEntry> {
        self.entries.iter().filter(move |entry| entry.key.matches(query))
    }

    /// Resolves a field-level (or deeper) query to node paths.
    ///
    /// Leaves are projected up to the depth the query addresses, so a
    /// field query against a composite field yields the field once rather
    /// than each of its leaves. With `roll_up`, a query for component 1
    /// also accepts a base field in that position.
    pub(crate) fn resolve(&self, query: &LocationKey, roll_up: bool, first_only: bool) -> Vec<NodePath> {
        if query.is_segment_only() {
            return Vec::new();
        }
        if let Some(entry) = self.get(query) {
            return vec![entry.path];
        }

        let depth = query.depth().max(Depth::Field);
        let widened = (roll_up && query.component() == Some(0) && !query.has_subcomponent())
            .then(|| query.without_component());

        let mut paths: Vec<NodePath> = Vec::new();
        for entry in &self.entries {
            let rolled_up = || {
                widened
                    .as_ref()
                    .is_some_and(|w| !entry.key.has_component() && entry.key.matches(w))
            };
            if !entry.key.matches(query) && !rolled_up() {
                continue;
            }

            // Leaves of one node are contiguous
            let path = entry.path.truncate(depth);
            if paths.last() != Some(&path) {
                paths.push(path);
                if first_only {
                    break;
                }
            }
        }
        paths
    }
}

struct Leaf<'a> {
    name: &'a str,
    occurrence: usize,
    path: NodePath,
}

/// Statistics about the index held by an engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexStats {
    /// Leaves in the current index.
    pub entries: usize,
    /// Segments in the current index.
    pub segments: usize,
    /// Builds performed since the engine was created.
    pub rebuilds: u64,
    /// Duration of the most recent build.
    pub last_build: Duration,
}

impl std::fmt::Display for IndexStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} entries over {} segments, {} rebuilds (last {:?})",
            self.entries, self.segments, self.rebuilds, self.last_build
        )
    }
}
