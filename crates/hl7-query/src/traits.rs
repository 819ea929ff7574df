//! Capabilities shared across the tree and the query surface.
//!
//! [`DataField`] is the uniform leaf-value abstraction: every leaf node
//! and the [`EmptyField`](crate::EmptyField) sentinel expose their raw text
//! through it. [`ToLocationKey`] lets query operations accept either
//! descriptor text or an already parsed [`LocationKey`].

use std::borrow::Cow;

use hl7_location::{LocationKey, LocationResult};

/// Text access shared by every node kind and the empty sentinel.
///
/// Leaves hand out their raw text. A composite field or component renders
/// its children with the default encoding characters, and writing text to
/// it collapses it into a leaf.
///
/// # Example
///
/// ```rust
/// use hl7_query::{DataField, EmptyField, Field};
///
/// fn text<D: DataField>(node: &D) -> String {
///     node.data().into_owned()
/// }
///
/// assert_eq!(text(&Field::base("SMITH")), "SMITH");
/// assert_eq!(text(&Field::from_texts(["DOE", "JOHN"])), "DOE^JOHN");
/// assert_eq!(text(&EmptyField::new()), "");
/// ```
pub trait DataField {
    /// Returns the text of this node.
    fn data(&self) -> Cow<'_, str>;

    /// Replaces the content of this node with `data`.
    fn set_data(&mut self, data: String);
}

/// Anything that can name a location: descriptor text or a parsed key.
///
/// # Example
///
/// ```rust
/// use hl7_location::LocationKey;
/// use hl7_query::ToLocationKey;
///
/// let from_text = "PID-3".to_location_key().unwrap();
/// let key = LocationKey::new("PID").with_field(3);
/// assert_eq!(*from_text, key);
/// assert_eq!(*key.to_location_key().unwrap(), key);
/// ```
pub trait ToLocationKey {
    /// Produces the key, parsing if necessary.
    fn to_location_key(&self) -> LocationResult<Cow<'_, LocationKey>>;

    /// Returns the descriptor text when the location is still unparsed.
    ///
    /// Used by the engine to consult its descriptor cache before parsing.
    fn as_descriptor(&self) -> Option<&str> {
        None
    }
}

impl ToLocationKey for str {
    fn to_location_key(&self) -> LocationResult<Cow<'_, LocationKey>> {
        hl7_location::parse(self).map(Cow::Owned)
    }

    fn as_descriptor(&self) -> Option<&str> {
        Some(self)
    }
}

impl ToLocationKey for String {
    fn to_location_key(&self) -> LocationResult<Cow<'_, LocationKey>> {
        self.as_str().to_location_key()
    }

    fn as_descriptor(&self) -> Option<&str> {
        Some(self)
    }
}

impl ToLocationKey for LocationKey {
    fn to_location_key(&self) -> LocationResult<Cow<'_, LocationKey>> {
        Ok(Cow::Borrowed(self))
    }
}

impl<T: ToLocationKey + ?Sized> ToLocationKey for &T {
    fn to_location_key(&self) -> LocationResult<Cow<'_, LocationKey>> {
        (**self).to_location_key()
    }

    fn as_descriptor(&self) -> Option<&str> {
        (**self).as_descriptor()
    }
}
