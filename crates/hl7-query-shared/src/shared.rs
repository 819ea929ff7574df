//! A structure and its query engine behind one reader/writer lock.

use hl7_query::{
    IndexStats, QueryConfig, QueryEngine, QueryView, Setting, Strategy, Structure, ToLocationKey,
};
use parking_lot::{RwLock, RwLockWriteGuard};

use crate::error::SharedResult;
use crate::types::SharedStats;

/// A structure shared between threads.
///
/// Any number of readers may query at once. A writer gets exclusive
/// access to the tree and leaves it dirty; the next reader rebuilds the
/// index under the exclusive lock, then downgrades to a shared lock to
/// run its query. A rebuild therefore never overlaps a mutation or
/// another query.
///
/// # Example
///
/// ```rust
/// use hl7_query::{Field, Segment, Structure};
/// use hl7_query_shared::SharedStructure;
///
/// let pid = Segment::new("PID")
///     .unwrap()
///     .with_field(Field::base("1"))
///     .with_field(Field::base(""))
///     .with_field(Field::from_texts(["12345", "DOE", "JOHN"]));
/// let shared = SharedStructure::new(Structure::from_segments(vec![pid]));
///
/// assert_eq!(shared.get_text("PID-3.2").unwrap().as_deref(), Some("DOE"));
///
/// shared.write(|structure| structure.push_segment(Segment::new("PV1").unwrap()));
/// assert!(shared.has("PV1").unwrap());
/// assert_eq!(shared.stats().refreshes, 1);
/// ```
pub struct SharedStructure {
    engine: RwLock<QueryEngine<Structure>>,
    stats: RwLock<SharedStats>,
}

impl SharedStructure {
    /// Wraps a structure with the default query configuration.
    pub fn new(structure: Structure) -> Self {
        Self::with_config(structure, QueryConfig::default())
    }

    /// Wraps a structure with a custom query configuration.
    pub fn with_config(structure: Structure, config: QueryConfig) -> Self {
        Self {
            engine: RwLock::new(QueryEngine::with_config(structure, config)),
            stats: RwLock::new(SharedStats::default()),
        }
    }

    /// Runs `f` with a read-only query view.
    ///
    /// Rebuilds the index first if the structure is dirty and the
    /// configuration uses the index.
    pub fn read<R>(&self, f: impl FnOnce(QueryView<'_>) -> R) -> R {
        {
            let engine = self.engine.read();
            if engine.is_fresh() || engine.config().strategy == Strategy::DirectWalk {
                self.stats.write().reads += 1;
                return f(engine.view());
            }
        }

        let mut engine = self.engine.write();
        // Another reader may have rebuilt while we waited
        let refreshed = engine.refresh_if_dirty();
        let engine = RwLockWriteGuard::downgrade(engine);

        {
            let mut stats = self.stats.write();
            stats.reads += 1;
            if refreshed {
                stats.refreshes += 1;
            }
        }
        if refreshed {
            tracing::debug!(entries = engine.index_stats().entries, "refreshed shared index");
        }
        f(engine.view())
    }

    /// Runs `f` with exclusive access to the structure. The structure is
    /// marked dirty.
    pub fn write<R>(&self, f: impl FnOnce(&mut Structure) -> R) -> R {
        let mut engine = self.engine.write();
        let out = f(engine.structure_mut());
        self.stats.write().writes += 1;
        tracing::trace!("shared structure written");
        out
    }

    /// Returns true if the location exists.
    pub fn has<L: ToLocationKey + ?Sized>(&self, location: &L) -> SharedResult<bool> {
        Ok(self.read(|view| view.has(location))?)
    }

    /// Returns the text of the first node at the location.
    ///
    /// Composite nodes are rendered with the default encoding characters.
    /// With the never-return-null policy on, a missing location yields an
    /// empty string rather than `None`.
    pub fn get_text<L: ToLocationKey + ?Sized>(&self, location: &L) -> SharedResult<Option<String>> {
        Ok(self.read(|view| view.get(location).map(|node| node.map(|n| n.to_string())))?)
    }

    /// Returns the text of every node at the location.
    pub fn get_all_text<L: ToLocationKey + ?Sized>(&self, location: &L) -> SharedResult<Vec<String>> {
        Ok(self.read(|view| {
            view.get_all(location)
                .map(|nodes| nodes.iter().map(|n| n.to_string()).collect())
        })?)
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.engine.read().structure().len()
    }

    /// Returns the query configuration.
    pub fn config(&self) -> QueryConfig {
        *self.engine.read().config()
    }

    /// Sets one policy toggle.
    pub fn set(&self, setting: Setting, value: bool) {
        self.engine.write().set(setting, value);
    }

    /// Returns statistics about the index.
    pub fn index_stats(&self) -> IndexStats {
        self.engine.read().index_stats()
    }

    /// Returns usage statistics.
    pub fn stats(&self) -> SharedStats {
        *self.stats.read()
    }

    /// Releases the structure.
    pub fn into_inner(self) -> Structure {
        self.engine.into_inner().into_inner()
    }
}

impl std::fmt::Debug for SharedStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStructure")
            .field("segments", &self.segment_count())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SharedError;
    use hl7_location::LocationError;
    use hl7_query::{Field, Segment};

    fn shared() -> SharedStructure {
        let pid = Segment::new("PID")
            .unwrap()
            .with_field(Field::base("1"))
            .with_field(Field::base(""))
            .with_field(Field::from_texts(["12345", "DOE", "JOHN"]));
        SharedStructure::new(Structure::from_segments(vec![pid]))
    }

    #[test]
    fn test_read_counts() {
        let shared = shared();
        shared.read(|view| assert!(view.uses_index()));
        shared.read(|_| ());
        assert_eq!(shared.stats().reads, 2);
        assert_eq!(shared.stats().refreshes, 0);
    }

    #[test]
    fn test_write_then_read_refreshes_once() {
        let shared = shared();
        shared.write(|structure| structure.push_segment(Segment::new("PV1").unwrap()));

        assert!(shared.read(|view| view.uses_index()));
        assert!(shared.has("PV1").unwrap());

        let stats = shared.stats();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.refreshes, 1);
        assert_eq!(shared.index_stats().rebuilds, 2);
    }

    #[test]
    fn test_direct_walk_reads_never_refresh() {
        let config = QueryConfig::builder().with_strategy(Strategy::DirectWalk).build();
        let shared = SharedStructure::with_config(Structure::new(), config);
        shared.write(|structure| structure.push_segment(Segment::new("PID").unwrap()));

        assert!(shared.has("PID").unwrap());
        assert_eq!(shared.stats().refreshes, 0);
    }

    #[test]
    fn test_text_helpers() {
        let shared = shared();
        assert_eq!(shared.get_text("PID-3").unwrap().as_deref(), Some("12345^DOE^JOHN"));
        assert_eq!(shared.get_text("ZZZ-1").unwrap().as_deref(), Some(""));
        assert_eq!(shared.get_all_text("PID-3.3").unwrap(), vec!["JOHN"]);

        shared.set(Setting::NeverReturnNull, false);
        assert_eq!(shared.get_text("ZZZ-1").unwrap(), None);
        assert!(!shared.config().never_return_null);
    }

    #[test]
    fn test_descriptor_errors_propagate() {
        let shared = shared();
        assert!(matches!(shared.get_text("PID-"), Err(SharedError::Descriptor(_))));
        assert!(matches!(shared.get_all_text("PID-x"), Err(SharedError::Descriptor(_))));
        assert!(matches!(
            shared.has(""),
            Err(SharedError::Descriptor(LocationError::EmptyDescriptor))
        ));
    }

    #[test]
    fn test_into_inner() {
        let shared = shared();
        shared.write(|structure| structure.push_segment(Segment::new("PV1").unwrap()));
        let structure = shared.into_inner();
        assert_eq!(structure.len(), 2);
        assert!(structure.is_dirty());
    }
}
