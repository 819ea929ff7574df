//! Location keys: coordinates into the segment/field/component tree.

use std::fmt;

/// How deep into the tree a key addresses.
///
/// Ordered from shallowest to deepest, so `Depth::Field < Depth::Component`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Depth {
    /// A whole segment occurrence (`PID`).
    Segment,
    /// A field repetition (`PID-3`).
    Field,
    /// A component of a field (`PID-3.1`).
    Component,
    /// A subcomponent of a component (`PID-3.1.2`).
    Subcomponent,
}

/// An immutable coordinate identifying a node, or a set of nodes, in a
/// parsed message.
///
/// A key carries the segment name plus five indices, each of which may be
/// unspecified (`None`). A *canonical* key, as recorded in a structure
/// index, specifies everything down to the leaf it names. A *query* key
/// may leave any index unspecified, which acts as a wildcard.
///
/// All indices are stored 0-based. Field position is the segment slot
/// number, where slot 0 holds the segment identifier, so `PID-3` is
/// field position 3. Descriptor text writes components and
/// subcomponents 1-based; the parser converts them. Position `0` names
/// no node: it maps to index `usize::MAX`, which no child can occupy, and
/// renders back as `0`.
///
/// Segment names are normalized to ASCII uppercase so that name identity
/// is case-insensitive.
///
/// # Example
///
/// ```rust
/// use hl7_location::LocationKey;
///
/// let query = LocationKey::new("pid").with_field(3).with_component(0);
/// let canonical = LocationKey::canonical("PID", 0, 3, 1, Some(0), None);
///
/// assert!(canonical.matches(&query));
/// assert_eq!(query.to_string(), "PID-3.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationKey {
    segment: String,
    segment_index: Option<usize>,
    field: Option<usize>,
    repetition: Option<usize>,
    component: Option<usize>,
    subcomponent: Option<usize>,
}

impl LocationKey {
    /// Creates a segment-only key with every index unspecified.
    pub fn new(segment: impl AsRef<str>) -> Self {
        Self {
            segment: segment.as_ref().to_ascii_uppercase(),
            segment_index: None,
            field: None,
            repetition: None,
            component: None,
            subcomponent: None,
        }
    }

    /// Creates a fully specified key for a leaf node.
    ///
    /// `component` and `subcomponent` are `None` when the leaf is a base
    /// field or a base component respectively.
    pub fn canonical(
        segment: impl AsRef<str>,
        segment_index: usize,
        field: usize,
        repetition: usize,
        component: Option<usize>,
        subcomponent: Option<usize>,
    ) -> Self {
        Self {
            segment: segment.as_ref().to_ascii_uppercase(),
            segment_index: Some(segment_index),
            field: Some(field),
            repetition: Some(repetition),
            component,
            subcomponent,
        }
    }

    /// Sets the 0-based segment occurrence index.
    pub fn with_segment_index(mut self, index: usize) -> Self {
        self.segment_index = Some(index);
        self
    }

    /// Sets the field position (segment slot).
    pub fn with_field(mut self, field: usize) -> Self {
        self.field = Some(field);
        self
    }

    /// Sets the 0-based repetition index.
    pub fn with_repetition(mut self, repetition: usize) -> Self {
        self.repetition = Some(repetition);
        self
    }

    /// Sets the 0-based component index.
    pub fn with_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    /// Sets the 0-based subcomponent index.
    pub fn with_subcomponent(mut self, subcomponent: usize) -> Self {
        self.subcomponent = Some(subcomponent);
        self
    }

    /// Returns a copy with the component and subcomponent cleared.
    pub fn without_component(&self) -> Self {
        Self {
            component: None,
            subcomponent: None,
            ..self.clone()
        }
    }

    /// Returns the normalized (uppercase) segment name.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the segment occurrence index, if specified.
    pub fn segment_index(&self) -> Option<usize> {
        self.segment_index
    }

    /// Returns the field position, if specified.
    pub fn field(&self) -> Option<usize> {
        self.field
    }

    /// Returns the repetition index, if specified.
    pub fn repetition(&self) -> Option<usize> {
        self.repetition
    }

    /// Returns the 0-based component index, if specified.
    pub fn component(&self) -> Option<usize> {
        self.component
    }

    /// Returns the 1-based component position as written in descriptors.
    pub fn component_position(&self) -> Option<usize> {
        self.component.map(position)
    }

    /// Returns the 0-based subcomponent index, if specified.
    pub fn subcomponent(&self) -> Option<usize> {
        self.subcomponent
    }

    /// Returns true if a field position is specified.
    pub fn has_field(&self) -> bool {
        self.field.is_some()
    }

    /// Returns true if a component index is specified.
    pub fn has_component(&self) -> bool {
        self.component.is_some()
    }

    /// Returns true if a subcomponent index is specified.
    pub fn has_subcomponent(&self) -> bool {
        self.subcomponent.is_some()
    }

    /// Returns true if the key names a segment without a field suffix.
    pub fn is_segment_only(&self) -> bool {
        self.field.is_none()
    }

    /// Returns how deep this key addresses.
    pub fn depth(&self) -> Depth {
        if self.subcomponent.is_some() {
            Depth::Subcomponent
        } else if self.component.is_some() {
            Depth::Component
        } else if self.field.is_some() {
            Depth::Field
        } else {
            Depth::Segment
        }
    }

    /// Returns true if `name` identifies the same segment, ignoring case.
    pub fn names_segment(&self, name: &str) -> bool {
        self.segment.eq_ignore_ascii_case(name)
    }

    /// Checks whether this (canonical) key satisfies a query key.
    ///
    /// Every index the query leaves unspecified matches anything. Every
    /// index the query specifies must be equal on both sides, including
    /// the case where this key has no value there. The relation is only
    /// meaningful in this direction: `canonical.matches(&query)`.
    pub fn matches(&self, query: &LocationKey) -> bool {
        fn slot(mine: Option<usize>, wanted: Option<usize>) -> bool {
            wanted.is_none() || mine == wanted
        }

        self.segment == query.segment
            && slot(self.segment_index, query.segment_index)
            && slot(self.field, query.field)
            && slot(self.repetition, query.repetition)
            && slot(self.component, query.component)
            && slot(self.subcomponent, query.subcomponent)
    }
}

/// 0-based index to 1-based descriptor position. Wraps so that the
/// unreachable index `usize::MAX` is written as position `0`.
fn position(index: usize) -> usize {
    index.wrapping_add(1)
}

impl fmt::Display for LocationKey {
    /// Renders the key in descriptor syntax.
    ///
    /// An unspecified field position followed by deeper indices is written
    /// as `*`; such keys cannot be parsed back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment)?;
        if let Some(index) = self.segment_index {
            write!(f, "[{}]", index)?;
        }

        let deeper = self.repetition.is_some() || self.component.is_some();
        match self.field {
            Some(field) => write!(f, "-{}", field)?,
            None if deeper => write!(f, "-*")?,
            None => return Ok(()),
        }
        if let Some(repetition) = self.repetition {
            write!(f, "({})", repetition)?;
        }
        if let Some(component) = self.component {
            write!(f, ".{}", position(component))?;
            if let Some(subcomponent) = self.subcomponent {
                write!(f, ".{}", position(subcomponent))?;
            }
        }
        Ok(())
    }
}
