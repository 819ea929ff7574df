//! Query engine implementation.

use std::borrow::{BorrowMut, Cow};
use std::time::Instant;

use hashbrown::HashSet;
use hl7_location::LocationKey;

use crate::cache::DescriptorCache;
use crate::config::{QueryConfig, Setting, Strategy};
use crate::error::{QueryError, QueryResult};
use crate::index::{IndexStats, StructureIndex};
use crate::node::{EmptyField, Node, NodePath};
use crate::result::{self, Branch};
use crate::traits::ToLocationKey;
use crate::tree::{Segment, Structure};
use crate::walk;

/// Main query engine.
///
/// Binds to one [`Structure`], either borrowed (`&mut Structure`) or
/// owned, and keeps a [`StructureIndex`] over it. The index is built on
/// creation and rebuilt lazily by the next index-based query after the
/// structure reports itself dirty.
///
/// Operations that may rebuild take `&mut self`. [`view`](Self::view)
/// gives a read-only handle that never rebuilds.
///
/// # Example
///
/// ```rust
/// use hl7_query::{Field, QueryEngine, Segment, Structure};
///
/// let pid = Segment::new("PID")
///     .unwrap()
///     .with_field(Field::base("1"))
///     .with_field(Field::base(""))
///     .with_field(Field::from_texts(["12345", "DOE", "JOHN"]));
/// let mut structure = Structure::from_segments(vec![pid]);
///
/// let mut engine = QueryEngine::new(&mut structure);
/// let id = engine.get("PID-3.1").unwrap().unwrap();
/// assert_eq!(id.data(), Some("12345"));
///
/// assert!(engine.has("PID").unwrap());
/// assert!(!engine.has("ZZZ-1").unwrap());
/// ```
#[derive(Debug)]
pub struct QueryEngine<S = Structure> {
    structure: S,
    index: StructureIndex,
    config: QueryConfig,
    cache: Option<DescriptorCache>,
    stats: IndexStats,
}

impl<S: BorrowMut<Structure>> QueryEngine<S> {
    /// Creates an engine with default configuration and builds the index.
    pub fn new(structure: S) -> Self {
        Self::with_config(structure, QueryConfig::default())
    }

    /// Creates an engine with custom configuration and builds the index.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hl7_query::{QueryConfig, QueryEngine, Strategy, Structure};
    ///
    /// let config = QueryConfig::builder()
    ///     .with_never_return_null(false)
    ///     .with_strategy(Strategy::DirectWalk)
    ///     .build();
    /// let mut engine = QueryEngine::with_config(Structure::new(), config);
    ///
    /// assert!(engine.get("ZZZ-1").unwrap().is_none());
    /// ```
    pub fn with_config(structure: S, config: QueryConfig) -> Self {
        let mut engine = Self {
            structure,
            index: StructureIndex::default(),
            cache: config.descriptor_cache.map(DescriptorCache::new),
            config,
            stats: IndexStats::default(),
        };
        engine.refresh();
        engine
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Replaces the configuration. A changed descriptor cache setting
    /// starts a new, empty cache.
    pub fn set_config(&mut self, config: QueryConfig) {
        if config.descriptor_cache != self.config.descriptor_cache {
            self.cache = config.descriptor_cache.map(DescriptorCache::new);
        }
        self.config = config;
    }

    /// Sets one policy toggle.
    pub fn set(&mut self, setting: Setting, value: bool) {
        self.config.set(setting, value);
    }

    /// Sets one policy toggle by name, see [`QueryConfig::set_by_name`].
    pub fn set_by_name(&mut self, name: &str, value: &str) -> QueryResult<()> {
        self.config.set_by_name(name, value)
    }

    /// Returns the descriptor cache, if enabled.
    pub fn descriptor_cache(&self) -> Option<&DescriptorCache> {
        self.cache.as_ref()
    }

    /// Returns the bound structure.
    pub fn structure(&self) -> &Structure {
        self.structure.borrow()
    }

    /// Returns the bound structure for editing. Marks it dirty.
    pub fn structure_mut(&mut self) -> &mut Structure {
        let structure: &mut Structure = self.structure.borrow_mut();
        structure.mark_dirty();
        structure
    }

    /// Releases the structure binding.
    pub fn into_inner(self) -> S {
        self.structure
    }

    /// Returns true if the index reflects the current tree.
    pub fn is_fresh(&self) -> bool {
        !self.structure().is_dirty()
    }

    /// Rebuilds the index unconditionally.
    pub fn refresh(&mut self) {
        let start = Instant::now();
        let structure: &mut Structure = self.structure.borrow_mut();
        self.index = StructureIndex::build(structure);
        structure.mark_fresh();

        self.stats.entries = self.index.len();
        self.stats.segments = self.index.segment_count();
        self.stats.rebuilds += 1;
        self.stats.last_build = start.elapsed();

        tracing::debug!(
            entries = self.stats.entries,
            segments = self.stats.segments,
            elapsed = ?self.stats.last_build,
            "rebuilt structure index"
        );
    }

    /// Rebuilds the index if the structure is dirty. Returns true if a
    /// rebuild happened.
    pub fn refresh_if_dirty(&mut self) -> bool {
        if self.is_fresh() {
            return false;
        }
        self.refresh();
        true
    }

    /// Returns the index, rebuilding it first if stale.
    pub fn index(&mut self) -> &StructureIndex {
        self.refresh_if_dirty();
        &self.index
    }

    /// Returns statistics about the index.
    pub fn index_stats(&self) -> IndexStats {
        self.stats
    }

    /// Returns a read-only query handle using the engine configuration.
    ///
    /// The handle uses the index when it is fresh and falls back to the
    /// direct walk when the structure is dirty.
    pub fn view(&self) -> QueryView<'_> {
        self.view_with(self.config)
    }

    /// Returns a read-only query handle using `config` for this handle
    /// only.
    pub fn view_with(&self, config: QueryConfig) -> QueryView<'_> {
        QueryView::new(self.structure(), &self.index, config, self.cache.as_ref())
    }

    fn prepare(&mut self, strategy: Strategy) {
        if strategy == Strategy::Indexed {
            self.refresh_if_dirty();
        }
    }

    /// Returns true if the location exists. See [`QueryView::has`].
    pub fn has<L: ToLocationKey + ?Sized>(&mut self, location: &L) -> QueryResult<bool> {
        self.prepare(self.config.strategy);
        self.view().has(location)
    }

    /// Returns the first node at the location. See [`QueryView::get`].
    pub fn get<L: ToLocationKey + ?Sized>(&mut self, location: &L) -> QueryResult<Option<Node<'_>>> {
        self.prepare(self.config.strategy);
        self.view().get(location)
    }

    /// Like [`get`](Self::get) with a per-call configuration.
    pub fn get_with<L: ToLocationKey + ?Sized>(
        &mut self,
        location: &L,
        config: &QueryConfig,
    ) -> QueryResult<Option<Node<'_>>> {
        self.prepare(config.strategy);
        self.view_with(*config).get(location)
    }

    /// Returns every node at the location. See [`QueryView::get_all`].
    pub fn get_all<L: ToLocationKey + ?Sized>(&mut self, location: &L) -> QueryResult<Vec<Node<'_>>> {
        self.prepare(self.config.strategy);
        self.view().get_all(location)
    }

    /// Like [`get_all`](Self::get_all) with a per-call configuration.
    pub fn get_all_with<L: ToLocationKey + ?Sized>(
        &mut self,
        location: &L,
        config: &QueryConfig,
    ) -> QueryResult<Vec<Node<'_>>> {
        self.prepare(config.strategy);
        self.view_with(*config).get_all(location)
    }

    /// Strict singular lookup. See [`QueryView::resolve`].
    pub fn resolve<L: ToLocationKey + ?Sized>(&mut self, location: &L) -> QueryResult<Node<'_>> {
        self.prepare(self.config.strategy);
        self.view().resolve(location)
    }

    /// Returns the first segment the location names. See
    /// [`QueryView::get_segment`].
    pub fn get_segment<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Option<&Segment>> {
        self.view().get_segment(location)
    }

    /// Returns every segment the location names. See
    /// [`QueryView::get_all_segments`].
    pub fn get_all_segments<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Vec<&Segment>> {
        self.view().get_all_segments(location)
    }
}

/// Read-only query handle over a structure and its index.
///
/// Obtained from [`QueryEngine::view`]. Never rebuilds the index: if the
/// structure is dirty, or the configuration selects
/// [`Strategy::DirectWalk`], queries walk the tree directly. Both paths
/// return the same nodes.
#[derive(Debug, Clone, Copy)]
pub struct QueryView<'a> {
    structure: &'a Structure,
    index: Option<&'a StructureIndex>,
    config: QueryConfig,
    cache: Option<&'a DescriptorCache>,
}

impl<'a> QueryView<'a> {
    fn new(
        structure: &'a Structure,
        index: &'a StructureIndex,
        config: QueryConfig,
        cache: Option<&'a DescriptorCache>,
    ) -> Self {
        let index = match config.strategy {
            Strategy::Indexed if structure.is_dirty() => {
                tracing::trace!("structure index is stale, falling back to direct walk");
                None
            }
            Strategy::Indexed => Some(index),
            Strategy::DirectWalk => None,
        };
        Self {
            structure,
            index,
            config,
            cache,
        }
    }

    /// Returns the structure this view reads.
    pub fn structure(&self) -> &'a Structure {
        self.structure
    }

    /// Returns true if queries go through the index.
    pub fn uses_index(&self) -> bool {
        self.index.is_some()
    }

    /// Returns the configuration this view applies.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Returns true if the location exists.
    ///
    /// A segment-only location exists when at least one matching segment
    /// occurrence is present. Any deeper location exists when a singular
    /// lookup finds a real node, regardless of the never-return-null
    /// policy.
    pub fn has<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<bool> {
        let key = self.key(location)?;
        if key.is_segment_only() {
            return Ok(!walk::segments_matching(self.structure, &key).is_empty());
        }
        Ok(self.find(&key).is_some())
    }

    /// Returns the first node at the location, in document order.
    ///
    /// Unspecified segment or repetition indices select the first match.
    /// When nothing is found the result is the empty sentinel if the
    /// never-return-null policy is on, and `None` otherwise. A
    /// segment-only location never names a node. Only a malformed
    /// descriptor is an error.
    pub fn get<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Option<Node<'a>>> {
        let key = self.key(location)?;
        let found = self.find(&key);
        Ok(found.or_else(|| {
            self.config
                .never_return_null
                .then(|| Node::Empty(EmptyField::new()))
        }))
    }

    /// Returns every node at the location, in document order.
    ///
    /// Unspecified segment or repetition indices select every match. Each
    /// node appears once. Nothing found is an empty list.
    pub fn get_all<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Vec<Node<'a>>> {
        let key = self.key(location)?;
        let mut seen: HashSet<NodePath> = HashSet::new();
        Ok(self
            .branches(&key, false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|path| seen.insert(*path))
            .filter_map(|path| self.structure.node(&path))
            .collect())
    }

    /// Strict singular lookup with no fallback policy.
    ///
    /// Fails with [`QueryError::NotFound`] or
    /// [`QueryError::IndexOutOfRange`] when nothing is found. The
    /// roll-up-dot-one policy still applies.
    pub fn resolve<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Node<'a>> {
        let key = self.key(location)?;
        let branch = match result::first(self.branches(&key, true)) {
            // The index knows only hits; the walk can say why
            Err(_) if self.index.is_some() => result::first(walk::walk(
                self.structure,
                &key,
                self.config.roll_up_dot_one,
                true,
            )),
            branch => branch,
        };
        let path = branch.map_err(|miss| miss.into_error(&key))?;
        self.structure
            .node(&path)
            .ok_or_else(|| QueryError::NotFound(key.into_owned()))
    }

    /// Returns the first segment the location names.
    ///
    /// Only the segment name and occurrence index are considered; any
    /// field suffix is ignored.
    pub fn get_segment<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Option<&'a Segment>> {
        let key = self.key(location)?;
        Ok(walk::segments_matching(self.structure, &key)
            .into_iter()
            .next()
            .map(|(_, segment)| segment))
    }

    /// Returns every segment the location names, in document order.
    pub fn get_all_segments<L: ToLocationKey + ?Sized>(&self, location: &L) -> QueryResult<Vec<&'a Segment>> {
        let key = self.key(location)?;
        Ok(walk::segments_matching(self.structure, &key)
            .into_iter()
            .map(|(_, segment)| segment)
            .collect())
    }

    fn key<'k, L: ToLocationKey + ?Sized>(&self, location: &'k L) -> QueryResult<Cow<'k, LocationKey>> {
        if let (Some(cache), Some(descriptor)) = (self.cache, location.as_descriptor()) {
            return Ok(Cow::Owned(cache.get_or_parse(descriptor)?));
        }
        Ok(location.to_location_key()?)
    }

    fn find(&self, key: &LocationKey) -> Option<Node<'a>> {
        let path = result::first(self.branches(key, true)).ok()?;
        self.structure.node(&path)
    }

    fn branches(&self, key: &LocationKey, first_only: bool) -> Vec<Branch> {
        let roll_up = self.config.roll_up_dot_one;
        match self.index {
            Some(index) => index
                .resolve(key, roll_up, first_only)
                .into_iter()
                .map(Ok)
                .collect(),
            None => walk::walk(self.structure, key, roll_up, first_only),
        }
    }
}
