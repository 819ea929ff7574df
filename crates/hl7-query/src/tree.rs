//! The owned field tree of a parsed message.
//!
//! ```text
//! Structure ─┬─ Segment ─┬─ RepeatingField ─┬─ Field ─┬─ FieldComponent ─┬─ FieldSubcomponent
//!            │           │  (one per slot)  │ (reps)  │                  │
//! ```
//!
//! The tree is filled by an upstream tokenizer; this crate only walks it.
//! A [`Field`] or [`FieldComponent`] is either a base leaf holding text or
//! a composite holding at least one child, never both.

use std::borrow::Cow;
use std::fmt;

use crate::error::{Level, QueryError, QueryResult};
use crate::node::{Node, NodePath};
use crate::traits::DataField;

/// Separator between components when rendering a composite field.
pub const COMPONENT_SEPARATOR: char = '^';
/// Separator between subcomponents when rendering a composite component.
pub const SUBCOMPONENT_SEPARATOR: char = '&';
/// Separator between repetitions when rendering a repeating field.
pub const REPETITION_SEPARATOR: char = '~';

// =============================================================================
// Base-or-composite content
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content<C> {
    Base(String),
    Composite(Vec<C>),
}

impl<C> Content<C> {
    fn from_children(children: Vec<C>) -> Self {
        if children.is_empty() {
            Content::Base(String::new())
        } else {
            Content::Composite(children)
        }
    }

    fn is_base(&self) -> bool {
        matches!(self, Content::Base(_))
    }

    fn children(&self) -> &[C] {
        match self {
            Content::Base(_) => &[],
            Content::Composite(children) => children,
        }
    }

    fn children_mut(&mut self) -> &mut [C] {
        match self {
            Content::Base(_) => &mut [],
            Content::Composite(children) => children,
        }
    }

    fn text(&self) -> Option<&str> {
        match self {
            Content::Base(text) => Some(text),
            Content::Composite(_) => None,
        }
    }
}

impl<C: fmt::Display> Content<C> {
    fn render(&self, f: &mut fmt::Formatter<'_>, separator: char) -> fmt::Result {
        match self {
            Content::Base(text) => f.write_str(text),
            Content::Composite(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", separator)?;
                    }
                    write!(f, "{}", child)?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// Leaves and composites
// =============================================================================

/// The smallest addressable unit. Always a leaf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSubcomponent {
    data: String,
}

impl FieldSubcomponent {
    /// Creates a subcomponent holding `data`.
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Returns the raw text.
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl DataField for FieldSubcomponent {
    fn data(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.data)
    }

    fn set_data(&mut self, data: String) {
        self.data = data;
    }
}

impl fmt::Display for FieldSubcomponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// A component of a composite field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldComponent {
    content: Content<FieldSubcomponent>,
}

impl FieldComponent {
    /// Creates a base component holding `data`.
    pub fn base(data: impl Into<String>) -> Self {
        Self {
            content: Content::Base(data.into()),
        }
    }

    /// Creates a composite component. An empty list yields an empty base
    /// component.
    pub fn composite(subcomponents: Vec<FieldSubcomponent>) -> Self {
        Self {
            content: Content::from_children(subcomponents),
        }
    }

    /// Returns true if this component has no subcomponents.
    pub fn is_base(&self) -> bool {
        self.content.is_base()
    }

    /// Returns the text of a base component, or `None` for a composite.
    pub fn data(&self) -> Option<&str> {
        self.content.text()
    }

    /// Replaces the content with base text, discarding any subcomponents.
    pub fn set_data(&mut self, data: impl Into<String>) {
        self.content = Content::Base(data.into());
    }

    /// Returns the subcomponents (empty for a base component).
    pub fn subcomponents(&self) -> &[FieldSubcomponent] {
        self.content.children()
    }

    /// Returns the subcomponent at a 0-based index.
    pub fn subcomponent(&self, index: usize) -> Option<&FieldSubcomponent> {
        self.content.children().get(index)
    }

    /// Returns the subcomponent at a 0-based index, mutably.
    pub fn subcomponent_mut(&mut self, index: usize) -> Option<&mut FieldSubcomponent> {
        self.content.children_mut().get_mut(index)
    }
}

impl DataField for FieldComponent {
    fn data(&self) -> Cow<'_, str> {
        match self.content.text() {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(self.to_string()),
        }
    }

    fn set_data(&mut self, data: String) {
        self.content = Content::Base(data);
    }
}

impl fmt::Display for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.content.render(f, SUBCOMPONENT_SEPARATOR)
    }
}

/// One field value, i.e. one repetition of a field position.
///
/// # Example
///
/// ```rust
/// use hl7_query::Field;
///
/// let name = Field::from_texts(["DOE", "JOHN"]);
/// assert!(!name.is_base());
/// assert_eq!(name.to_string(), "DOE^JOHN");
///
/// let id = Field::base("12345");
/// assert_eq!(id.data(), Some("12345"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    content: Content<FieldComponent>,
}

impl Field {
    /// Creates a base field holding `data`.
    pub fn base(data: impl Into<String>) -> Self {
        Self {
            content: Content::Base(data.into()),
        }
    }

    /// Creates a composite field. An empty list yields an empty base field.
    pub fn composite(components: Vec<FieldComponent>) -> Self {
        Self {
            content: Content::from_children(components),
        }
    }

    /// Creates a composite field whose components are all base values.
    pub fn from_texts<I, T>(components: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::composite(components.into_iter().map(FieldComponent::base).collect())
    }

    /// Returns true if this field has no components.
    pub fn is_base(&self) -> bool {
        self.content.is_base()
    }

    /// Returns the text of a base field, or `None` for a composite.
    pub fn data(&self) -> Option<&str> {
        self.content.text()
    }

    /// Replaces the content with base text, discarding any components.
    pub fn set_data(&mut self, data: impl Into<String>) {
        self.content = Content::Base(data.into());
    }

    /// Returns the components (empty for a base field).
    pub fn components(&self) -> &[FieldComponent] {
        self.content.children()
    }

    /// Returns the component at a 0-based index.
    pub fn component(&self, index: usize) -> Option<&FieldComponent> {
        self.content.children().get(index)
    }

    /// Returns the component at a 0-based index, mutably.
    pub fn component_mut(&mut self, index: usize) -> Option<&mut FieldComponent> {
        self.content.children_mut().get_mut(index)
    }
}

impl DataField for Field {
    fn data(&self) -> Cow<'_, str> {
        match self.content.text() {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(self.to_string()),
        }
    }

    fn set_data(&mut self, data: String) {
        self.content = Content::Base(data);
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.content.render(f, COMPONENT_SEPARATOR)
    }
}

/// All repetitions occupying one field position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatingField {
    repetitions: Vec<Field>,
}

impl RepeatingField {
    /// Creates a field position with no value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a field position holding one value.
    pub fn single(field: Field) -> Self {
        Self {
            repetitions: vec![field],
        }
    }

    /// Creates a field position from its repetitions, in message order.
    pub fn from_fields(repetitions: Vec<Field>) -> Self {
        Self { repetitions }
    }

    /// Appends a repetition.
    pub fn push(&mut self, field: Field) {
        self.repetitions.push(field);
    }

    /// Returns the repetitions.
    pub fn fields(&self) -> &[Field] {
        &self.repetitions
    }

    /// Returns the repetition at a 0-based index.
    pub fn field(&self, repetition: usize) -> Option<&Field> {
        self.repetitions.get(repetition)
    }

    /// Returns the repetition at a 0-based index, mutably.
    pub fn field_mut(&mut self, repetition: usize) -> Option<&mut Field> {
        self.repetitions.get_mut(repetition)
    }

    /// Returns the number of repetitions.
    pub fn len(&self) -> usize {
        self.repetitions.len()
    }

    /// Returns true if the position holds no value.
    pub fn is_empty(&self) -> bool {
        self.repetitions.is_empty()
    }
}

impl fmt::Display for RepeatingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.repetitions.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", REPETITION_SEPARATOR)?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

impl From<Field> for RepeatingField {
    fn from(field: Field) -> Self {
        Self::single(field)
    }
}

// =============================================================================
// Segment
// =============================================================================

/// One segment occurrence, e.g. a `PID` line.
///
/// Slot 0 holds the segment identifier as a base field, so the slot
/// number of every later field equals its HL7 field position.
///
/// # Example
///
/// ```rust
/// use hl7_query::{Field, Segment};
///
/// let pid = Segment::new("PID")
///     .unwrap()
///     .with_field(Field::base("1"))
///     .with_field(Field::base(""))
///     .with_field(Field::from_texts(["12345", "DOE", "JOHN"]));
///
/// assert_eq!(pid.len(), 4);
/// assert_eq!(pid.field(3).unwrap().to_string(), "12345^DOE^JOHN");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    name: String,
    fields: Vec<RepeatingField>,
}

impl Segment {
    /// Creates a segment with only its identifier slot filled.
    ///
    /// Fails if `name` is empty.
    pub fn new(name: impl Into<String>) -> QueryResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(QueryError::EmptySegmentName);
        }
        let identifier = RepeatingField::single(Field::base(name.clone()));
        Ok(Self {
            name,
            fields: vec![identifier],
        })
    }

    /// Returns the segment name as it appeared in the message.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `name` identifies this segment, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Appends the next field position.
    pub fn push_field(&mut self, field: impl Into<RepeatingField>) {
        self.fields.push(field.into());
    }

    /// Builder form of [`push_field`](Self::push_field).
    pub fn with_field(mut self, field: impl Into<RepeatingField>) -> Self {
        self.push_field(field);
        self
    }

    /// Stores a value at a field position, padding skipped positions with
    /// empty slots. Position 0 is the identifier slot and cannot be set.
    pub fn set_field(
        &mut self,
        position: usize,
        field: impl Into<RepeatingField>,
    ) -> QueryResult<()> {
        if position == 0 {
            return Err(QueryError::IndexOutOfRange {
                level: Level::Field,
                index: 0,
                len: self.fields.len(),
            });
        }
        if position >= self.fields.len() {
            self.fields.resize_with(position + 1, RepeatingField::new);
        }
        self.fields[position] = field.into();
        Ok(())
    }

    /// Returns every field position, slot 0 first.
    pub fn fields(&self) -> &[RepeatingField] {
        &self.fields
    }

    /// Returns the field position `position`.
    pub fn field(&self, position: usize) -> Option<&RepeatingField> {
        self.fields.get(position)
    }

    /// Returns the field position `position`, mutably.
    pub fn field_mut(&mut self, position: usize) -> Option<&mut RepeatingField> {
        self.fields.get_mut(position)
    }

    /// Returns the number of slots, including the identifier slot.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false: the identifier slot is present from construction.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// Structure
// =============================================================================

/// A full parsed message: an ordered sequence of segments plus the
/// freshness flag of any index built over it.
///
/// Every mutator sets the dirty flag. Collaborators that change nodes in
/// place through other means call [`mark_dirty`](Self::mark_dirty)
/// themselves. Only an index rebuild clears the flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    segments: Vec<Segment>,
    dirty: bool,
}

impl Default for Structure {
    fn default() -> Self {
        Self::new()
    }
}

impl Structure {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            dirty: true,
        }
    }

    /// Creates a structure from segments in message order.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            dirty: true,
        }
    }

    /// Returns the segments in message order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the segment at a slot (0-based position in the message).
    pub fn segment(&self, slot: usize) -> Option<&Segment> {
        self.segments.get(slot)
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends a segment.
    pub fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
        self.mark_dirty();
    }

    /// Inserts a segment at `slot`, shifting later segments down.
    pub fn insert_segment(&mut self, slot: usize, segment: Segment) -> QueryResult<()> {
        if slot > self.segments.len() {
            return Err(QueryError::IndexOutOfRange {
                level: Level::Segment,
                index: slot,
                len: self.segments.len(),
            });
        }
        self.segments.insert(slot, segment);
        self.mark_dirty();
        Ok(())
    }

    /// Removes and returns the segment at `slot`.
    pub fn remove_segment(&mut self, slot: usize) -> Option<Segment> {
        if slot >= self.segments.len() {
            return None;
        }
        self.mark_dirty();
        Some(self.segments.remove(slot))
    }

    /// Returns the segment list for arbitrary edits. Marks the structure
    /// dirty.
    pub fn segments_mut(&mut self) -> &mut Vec<Segment> {
        self.mark_dirty();
        &mut self.segments
    }

    /// Returns one segment for editing. Marks the structure dirty.
    pub fn segment_mut(&mut self, slot: usize) -> Option<&mut Segment> {
        self.mark_dirty();
        self.segments.get_mut(slot)
    }

    /// Flags any index built over this structure as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns true if the structure changed since the last index build.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_fresh(&mut self) {
        self.dirty = false;
    }

    /// Resolves a positional path to the node it names.
    pub fn node(&self, path: &NodePath) -> Option<Node<'_>> {
        let field = self
            .segments
            .get(path.segment)?
            .field(path.field)?
            .field(path.repetition)?;

        let Some(component_index) = path.component else {
            return Some(Node::Field(field));
        };
        let component = field.component(component_index)?;

        match path.subcomponent {
            None => Some(Node::Component(component)),
            Some(index) => component.subcomponent(index).map(Node::Subcomponent),
        }
    }

    /// Returns the number of leaves below this structure.
    pub fn leaf_count(&self) -> usize {
        self.segments
            .iter()
            .flat_map(|segment| segment.fields())
            .flat_map(|repeating| repeating.fields())
            .map(|field| {
                if field.is_base() {
                    return 1;
                }
                field
                    .components()
                    .iter()
                    .map(|c| c.subcomponents().len().max(1))
                    .sum()
            })
            .sum()
    }
}
