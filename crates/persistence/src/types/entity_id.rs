//! Composite entity identifiers.
//!
//! A raw record key may be loaded under several types. The externally visible
//! identifier binds the key to the record's primary type (the first type listed
//! for it at load time) as `primaryType:rawKey`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the primary type id and the raw key.
pub const ID_SEPARATOR: char = ':';

/// A composite entity identifier of the form `primaryType:rawKey`.
///
/// Decoding splits on the first separator, so raw keys may themselves contain
/// the separator. Type ids must not.
///
/// # Examples
///
/// ```
/// use recon_persistence::types::EntityId;
///
/// let id = EntityId::compose("person", "q42");
/// assert_eq!(id.as_str(), "person:q42");
/// assert_eq!(id.primary_type(), "person");
/// assert_eq!(id.raw_key(), "q42");
///
/// let bare = EntityId::new("q42");
/// assert_eq!(bare.primary_type(), "");
/// assert_eq!(bare.raw_key(), "q42");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wraps an already-composed identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Composes an identifier from a primary type id and a raw record key.
    pub fn compose(primary_type: &str, raw_key: &str) -> Self {
        Self(format!("{primary_type}{ID_SEPARATOR}{raw_key}"))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the raw record key.
    ///
    /// The whole identifier is returned when it contains no separator.
    pub fn raw_key(&self) -> &str {
        self.split().1
    }

    /// Returns the primary type id, or `""` when there is no separator.
    pub fn primary_type(&self) -> &str {
        self.split().0
    }

    /// Returns `(primary type id, raw key)`.
    pub fn split(&self) -> (&str, &str) {
        match self.0.split_once(ID_SEPARATOR) {
            Some((primary, key)) => (primary, key),
            None => ("", &self.0),
        }
    }

    /// Consumes the id and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
