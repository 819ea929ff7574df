//! Query results and positional node paths.

use std::borrow::Cow;
use std::fmt;

use hl7_location::Depth;

use crate::traits::DataField;
use crate::tree::{Field, FieldComponent, FieldSubcomponent};

/// Sentinel leaf returned in place of an absent value.
///
/// Carries no tree relationship. Produced only by failed lookups when the
/// never-return-null policy is enabled; the tree itself never holds one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmptyField {
    data: String,
}

impl EmptyField {
    /// Creates an empty sentinel.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DataField for EmptyField {
    fn data(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.data)
    }

    fn set_data(&mut self, data: String) {
        self.data = data;
    }
}

/// Positional address of a field-level (or deeper) node.
///
/// `segment` is the slot of the segment in the message, not its
/// per-name occurrence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodePath {
    /// Segment slot in the message.
    pub segment: usize,
    /// Field position within the segment.
    pub field: usize,
    /// Repetition index within the field position.
    pub repetition: usize,
    /// Component index, if the path goes below the field.
    pub component: Option<usize>,
    /// Subcomponent index, if the path goes below the component.
    pub subcomponent: Option<usize>,
}

impl NodePath {
    /// Creates a path to one field repetition.
    pub fn field(segment: usize, field: usize, repetition: usize) -> Self {
        Self {
            segment,
            field,
            repetition,
            component: None,
            subcomponent: None,
        }
    }

    /// Extends the path to a component.
    pub fn with_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    /// Extends the path to a subcomponent.
    pub fn with_subcomponent(mut self, subcomponent: usize) -> Self {
        self.subcomponent = Some(subcomponent);
        self
    }

    /// Returns the depth this path addresses.
    pub fn depth(&self) -> Depth {
        match (self.component, self.subcomponent) {
            (None, _) => Depth::Field,
            (Some(_), None) => Depth::Component,
            (Some(_), Some(_)) => Depth::Subcomponent,
        }
    }

    /// Cuts the path back to at most `depth`.
    ///
    /// A path shallower than `depth` is returned unchanged. Segment depth
    /// is treated as field depth, since paths always name a field.
    pub fn truncate(mut self, depth: Depth) -> Self {
        match depth {
            Depth::Segment | Depth::Field => {
                self.component = None;
                self.subcomponent = None;
            }
            Depth::Component => self.subcomponent = None,
            Depth::Subcomponent => {}
        }
        self
    }
}

/// A node returned by a query.
///
/// Borrowed from the structure, except for the [`Empty`](Node::Empty)
/// sentinel which is owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// A field repetition, base or composite.
    Field(&'a Field),
    /// A component, base or composite.
    Component(&'a FieldComponent),
    /// A subcomponent (always a leaf).
    Subcomponent(&'a FieldSubcomponent),
    /// The absent-value sentinel.
    Empty(EmptyField),
}

impl<'a> Node<'a> {
    /// Returns the raw text of a leaf, or `None` for a composite node.
    pub fn data(&self) -> Option<&str> {
        match self {
            Node::Field(field) => field.data(),
            Node::Component(component) => component.data(),
            Node::Subcomponent(sub) => Some(sub.data()),
            Node::Empty(empty) => Some(empty.data.as_str()),
        }
    }

    /// Returns the node as a [`DataField`].
    pub fn as_data_field(&self) -> &dyn DataField {
        match self {
            Node::Field(field) => *field,
            Node::Component(component) => *component,
            Node::Subcomponent(sub) => *sub,
            Node::Empty(empty) => empty,
        }
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        match self {
            Node::Field(field) => field.is_base(),
            Node::Component(component) => component.is_base(),
            Node::Subcomponent(_) | Node::Empty(_) => true,
        }
    }

    /// Returns true for the absent-value sentinel.
    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self, Node::Empty(_))
    }

    /// Returns the tree depth of the node, or `None` for the sentinel.
    pub fn depth(&self) -> Option<Depth> {
        match self {
            Node::Field(_) => Some(Depth::Field),
            Node::Component(_) => Some(Depth::Component),
            Node::Subcomponent(_) => Some(Depth::Subcomponent),
            Node::Empty(_) => None,
        }
    }

    /// Returns the field, if this node is one.
    pub fn as_field(&self) -> Option<&'a Field> {
        match self {
            Node::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Returns the component, if this node is one.
    pub fn as_component(&self) -> Option<&'a FieldComponent> {
        match self {
            Node::Component(component) => Some(component),
            _ => None,
        }
    }

    /// Returns the subcomponent, if this node is one.
    pub fn as_subcomponent(&self) -> Option<&'a FieldSubcomponent> {
        match self {
            Node::Subcomponent(sub) => Some(sub),
            _ => None,
        }
    }

    /// Returns true if both nodes are the very same tree node.
    ///
    /// Compares identity, not value: two equal texts at different
    /// locations are different nodes. The sentinel is never the same as
    /// anything.
    pub fn same_node(&self, other: &Node<'_>) -> bool {
        match (self, other) {
            (Node::Field(a), Node::Field(b)) => std::ptr::eq(*a, *b),
            (Node::Component(a), Node::Component(b)) => std::ptr::eq(*a, *b),
            (Node::Subcomponent(a), Node::Subcomponent(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Field(field) => write!(f, "{}", field),
            Node::Component(component) => write!(f, "{}", component),
            Node::Subcomponent(sub) => write!(f, "{}", sub),
            Node::Empty(empty) => f.write_str(&empty.data),
        }
    }
}
