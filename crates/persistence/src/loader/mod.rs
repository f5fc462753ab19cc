//! Dataset records and their resolution into a store's catalogs.
//!
//! Loaders produce a [`Dataset`]: store metadata plus a flat list of
//! [`Record`]s in file order. [`resolve_dataset`] turns that list into the
//! type catalog, the property catalog and the entity table that every
//! backend is built from:
//!
//! - the first declared type is the default type, given to entities whose
//!   type list is empty
//! - rows listing the pseudo-type `property` define a property for the other
//!   types on the row instead of an entity
//! - an entity's id is its raw key prefixed with its first type
//!   (see [`EntityId::compose`])
//! - type ids used but never declared are synthesized from the id
//!
//! The [`flatfile`] module reads and writes the tab-separated intermediate
//! format; [`tabular`] builds a dataset from CSV or tab-separated source files
//! described by an import configuration.

pub mod flatfile;
pub mod tabular;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::StoreMetadata;
use crate::error::LoadError;
use crate::types::{Entity, EntityId, Property, PropertyMap, Type};

pub use flatfile::{load_flat_file, parse_flat, write_flat};
pub use tabular::{ImportConfig, inspect_tables, load_tabular};

/// Pseudo-type that marks a row as a property definition.
pub const PROPERTY_PSEUDO_TYPE: &str = "property";

/// A property definition and the types it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    /// The property.
    pub property: Property,
    /// Ids of the types the property is declared for.
    pub type_ids: Vec<String>,
}

/// An entity row before type resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityRecord {
    /// Raw record key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Declared type ids in order; may be empty or include `property`.
    pub type_ids: Vec<String>,
    /// Property values.
    pub properties: PropertyMap,
}

/// One record of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A type declaration.
    Type(Type),
    /// A property declaration.
    Property(PropertyRecord),
    /// An entity, or a property definition when its types include
    /// [`PROPERTY_PSEUDO_TYPE`].
    Entity(EntityRecord),
}

/// Metadata and records as read from a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Store metadata.
    pub metadata: StoreMetadata,
    /// Records in source order.
    pub records: Vec<Record>,
}

/// A property in the resolved catalog.
#[derive(Debug, Clone)]
pub struct ResolvedProperty {
    /// The property.
    pub property: Arc<Property>,
    /// Ids of the types the property is declared for, without duplicates.
    pub type_ids: Vec<String>,
}

/// Catalogs and entities ready to be loaded into a backend.
#[derive(Debug, Clone)]
pub struct ResolvedDataset {
    /// Store metadata.
    pub metadata: StoreMetadata,
    /// All types: declared ones in order, then synthesized ones.
    pub types: Vec<Arc<Type>>,
    /// All properties in declaration order.
    pub properties: Vec<ResolvedProperty>,
    /// All entities, unique by composite id.
    pub entities: Vec<Entity>,
}

impl ResolvedDataset {
    /// Returns the type with the given id.
    pub fn type_by_id(&self, type_id: &str) -> Option<&Arc<Type>> {
        self.types.iter().find(|t| t.id == type_id)
    }
}

#[derive(Default)]
struct TypeCatalog {
    types: Vec<Arc<Type>>,
    index: HashMap<String, usize>,
}

impl TypeCatalog {
    fn declare(&mut self, ty: Type) {
        if self.index.contains_key(&ty.id) {
            debug!(type_id = %ty.id, "Ignoring duplicate type declaration");
            return;
        }
        self.index.insert(ty.id.clone(), self.types.len());
        self.types.push(Arc::new(ty));
    }

    fn get_or_synthesize(&mut self, type_id: &str) -> Arc<Type> {
        if let Some(&i) = self.index.get(type_id) {
            return Arc::clone(&self.types[i]);
        }
        warn!(type_id = %type_id, "Type used but not declared; synthesizing it");
        self.declare(Type::new(type_id, type_id));
        Arc::clone(&self.types[self.types.len() - 1])
    }
}

#[derive(Default)]
struct PropertyCatalog {
    properties: Vec<ResolvedProperty>,
    index: HashMap<String, usize>,
}

impl PropertyCatalog {
    fn declare(&mut self, property: Property, type_ids: Vec<String>) {
        match self.index.get(&property.id) {
            Some(&i) => {
                // First definition wins; later rows may only add types.
                let existing = &mut self.properties[i];
                for type_id in type_ids {
                    if !existing.type_ids.contains(&type_id) {
                        existing.type_ids.push(type_id);
                    }
                }
            }
            None => {
                let mut unique = Vec::with_capacity(type_ids.len());
                for type_id in type_ids {
                    if !unique.contains(&type_id) {
                        unique.push(type_id);
                    }
                }
                self.index
                    .insert(property.id.clone(), self.properties.len());
                self.properties.push(ResolvedProperty {
                    property: Arc::new(property),
                    type_ids: unique,
                });
            }
        }
    }
}

/// Resolves a dataset's records into catalogs and entities.
///
/// Fails with [`LoadError::MissingType`] when an entity has no type and no
/// type was declared before it.
pub fn resolve_dataset(dataset: Dataset) -> Result<ResolvedDataset, LoadError> {
    let Dataset { metadata, records } = dataset;

    let mut types = TypeCatalog::default();
    let mut properties = PropertyCatalog::default();
    let mut entities: Vec<Entity> = Vec::new();
    let mut entity_index: HashMap<EntityId, usize> = HashMap::new();

    for record in records {
        match record {
            Record::Type(ty) => types.declare(ty),
            Record::Property(PropertyRecord { property, type_ids }) => {
                for type_id in &type_ids {
                    types.get_or_synthesize(type_id);
                }
                properties.declare(property, type_ids);
            }
            Record::Entity(mut record) => {
                record.type_ids.retain(|t| !t.is_empty());
                if record.type_ids.is_empty() {
                    match types.types.first() {
                        Some(default_type) => record.type_ids.push(default_type.id.clone()),
                        None => return Err(LoadError::MissingType { key: record.key }),
                    }
                }

                if record.type_ids.iter().any(|t| t == PROPERTY_PSEUDO_TYPE) {
                    let type_ids: Vec<String> = record
                        .type_ids
                        .into_iter()
                        .filter(|t| t != PROPERTY_PSEUDO_TYPE)
                        .collect();
                    if type_ids.is_empty() {
                        warn!(property_id = %record.key, "Property row declares no types");
                    }
                    for type_id in &type_ids {
                        types.get_or_synthesize(type_id);
                    }
                    let mut property = Property::new(record.key, record.name);
                    property.description = record.description;
                    properties.declare(property, type_ids);
                    continue;
                }

                let entity_types: Vec<Arc<Type>> = record
                    .type_ids
                    .iter()
                    .map(|t| types.get_or_synthesize(t))
                    .collect();
                let entity = Entity {
                    id: EntityId::compose(&record.type_ids[0], &record.key),
                    name: record.name,
                    description: record.description,
                    types: entity_types,
                    properties: record.properties,
                };

                match entity_index.get(&entity.id) {
                    Some(&i) => {
                        debug!(entity_id = %entity.id, "Duplicate entity replaces earlier row");
                        entities[i] = entity;
                    }
                    None => {
                        entity_index.insert(entity.id.clone(), entities.len());
                        entities.push(entity);
                    }
                }
            }
        }
    }

    Ok(ResolvedDataset {
        metadata,
        types: types.types,
        properties: properties.properties,
        entities,
    })
}
