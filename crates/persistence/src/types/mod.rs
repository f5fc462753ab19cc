//! Core data model: types, properties, entities and scored candidates.

mod entity_id;
mod property_value;
mod query;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use entity_id::{EntityId, ID_SEPARATOR};
pub use property_value::{EntityRef, PropertyValue, ValueKind};
pub use query::{DEFAULT_LIMIT, QueryProperty, QueryRequest, QueryResponse};

/// A category of entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Unique id within a store.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional longer description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// View-URL template for entities of this type.
    #[serde(rename = "url", default, skip_serializing_if = "String::is_empty")]
    pub view_url: String,
}

impl Type {
    /// Creates a type with a name and no description or view URL.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            view_url: String::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An attribute that entities of one or more types may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Unique id within a store.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Optional longer description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Expected kind of the property's values.
    #[serde(skip)]
    pub value_kind: ValueKind,
}

impl Property {
    /// Creates a string-valued property.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            value_kind: ValueKind::default(),
        }
    }
}

/// Property values of an entity, keyed by property id.
pub type PropertyMap = BTreeMap<String, Vec<PropertyValue>>;

/// A single record of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Composite id (`primaryType:rawKey`).
    pub id: EntityId,

    /// Display name.
    pub name: String,

    /// Optional longer description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// All types the entity belongs to, primary type first.
    #[serde(rename = "type")]
    pub types: Vec<Arc<Type>>,

    /// Property values. Populated by entity lookups, left empty in search
    /// results.
    #[serde(skip)]
    pub properties: PropertyMap,
}

impl Entity {
    /// Returns `true` if the entity holds the given type.
    pub fn has_type(&self, type_id: &str) -> bool {
        self.types.iter().any(|t| t.id == type_id)
    }

    /// Returns the raw record key.
    pub fn raw_key(&self) -> &str {
        self.id.raw_key()
    }

    /// Returns the values of a property, or an empty slice.
    pub fn property_values(&self, property_id: &str) -> &[PropertyValue] {
        self.properties
            .get(property_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A scored search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Composite id of the entity.
    pub id: EntityId,

    /// Display name of the entity.
    pub name: String,

    /// Types of the entity.
    #[serde(rename = "type")]
    pub types: Vec<Arc<Type>>,

    /// Similarity score, conventionally 0 to 100 but unbounded above.
    pub score: f64,

    /// Whether the score counts as a confident match.
    #[serde(rename = "match")]
    pub is_match: bool,
}

impl Candidate {
    /// Builds a candidate for an entity, deriving `is_match` from the score.
    pub fn scored(entity: &Entity, score: f64) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            types: entity.types.clone(),
            score,
            is_match: crate::core::scoring::is_match(score),
        }
    }
}
