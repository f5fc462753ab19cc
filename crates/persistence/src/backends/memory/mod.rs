//! In-memory engine.
//!
//! Holds every type, property and entity in resident maps and answers
//! queries by scanning all entities with the heuristic scorer.
//!
//! # Immutability
//!
//! A [`MemoryStore`] is fully built by its constructors and exposes no way
//! to change it afterwards: every method takes `&self` and none uses
//! interior mutability. Concurrent readers therefore need no locks. Keep it
//! that way; a writer would require wrapping the maps in a lock.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::constraints::matches_all;
use crate::core::scoring::{self, EXACT_KEY_SCORE, heuristic_score, type_bonus};
use crate::core::{EntityStore, StoreMetadata, resolve_filters};
use crate::error::{LoadError, StoreResult};
use crate::loader::{Dataset, ResolvedDataset, load_flat_file, resolve_dataset};
use crate::types::{
    Candidate, DEFAULT_LIMIT, Entity, EntityId, Property, PropertyMap, QueryRequest,
    QueryResponse, Type,
};

/// An entity store held entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    metadata: StoreMetadata,
    types: Vec<Arc<Type>>,
    properties: HashMap<String, Vec<Arc<Property>>>,
    entities: HashMap<EntityId, Entity>,
    by_raw_key: HashMap<String, Vec<EntityId>>,
}

impl MemoryStore {
    /// Builds a store from a resolved dataset.
    pub fn from_resolved(dataset: ResolvedDataset) -> Self {
        let ResolvedDataset {
            metadata,
            types,
            properties: property_list,
            entities: entity_list,
        } = dataset;

        let mut properties: HashMap<String, Vec<Arc<Property>>> = HashMap::new();
        for resolved in property_list {
            for type_id in resolved.type_ids {
                properties
                    .entry(type_id)
                    .or_default()
                    .push(Arc::clone(&resolved.property));
            }
        }

        let mut entities = HashMap::with_capacity(entity_list.len());
        let mut by_raw_key: HashMap<String, Vec<EntityId>> = HashMap::new();
        for entity in entity_list {
            by_raw_key
                .entry(entity.raw_key().to_string())
                .or_default()
                .push(entity.id.clone());
            entities.insert(entity.id.clone(), entity);
        }

        info!(
            name = %metadata.name,
            entities = entities.len(),
            types = types.len(),
            properties = properties.values().map(Vec::len).sum::<usize>(),
            "Built in-memory store"
        );

        Self {
            metadata,
            types,
            properties,
            entities,
            by_raw_key,
        }
    }

    /// Resolves and loads a dataset.
    pub fn from_dataset(dataset: Dataset) -> Result<Self, LoadError> {
        Ok(Self::from_resolved(resolve_dataset(dataset)?))
    }

    /// Loads a flat file (optionally gzipped).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_dataset(load_flat_file(path)?)
    }

    /// Number of entities held.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` when the store holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities loaded under a raw key, one per primary type, in load order.
    fn exact_key_matches(&self, raw_key: &str) -> impl Iterator<Item = &Entity> {
        self.by_raw_key
            .get(raw_key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }
}

/// Copies an entity for a search result, without its property values.
fn summary(entity: &Entity) -> Entity {
    Entity {
        id: entity.id.clone(),
        name: entity.name.clone(),
        description: entity.description.clone(),
        types: entity.types.clone(),
        properties: PropertyMap::new(),
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    fn types(&self) -> Vec<Arc<Type>> {
        self.types.clone()
    }

    fn properties_for(&self, type_id: &str) -> Vec<Arc<Property>> {
        self.properties.get(type_id).cloned().unwrap_or_default()
    }

    async fn get_entity(&self, id: &EntityId) -> StoreResult<Option<Entity>> {
        let (type_id, raw_key) = id.split();
        let found = self
            .entities
            .get(id)
            .or_else(|| self.exact_key_matches(raw_key).find(|e| e.has_type(type_id)))
            .cloned();
        debug!(entity_id = %id, found = found.is_some(), "Entity lookup");
        Ok(found)
    }

    async fn query(&self, request: &QueryRequest) -> StoreResult<QueryResponse> {
        let limit = request.effective_limit();
        let filters = resolve_filters(&request.properties)?;
        debug!(
            query_id = %request.id,
            text = %request.text,
            type_id = ?request.type_filter(),
            constraints = filters.len(),
            limit,
            "Querying in-memory store"
        );

        let mut response = QueryResponse::empty(request);

        let exact: Vec<Candidate> = self
            .exact_key_matches(&request.text)
            .map(|e| Candidate::scored(e, EXACT_KEY_SCORE))
            .take(limit)
            .collect();
        if !exact.is_empty() {
            debug!(query_id = %request.id, hits = exact.len(), "Exact key match");
            response.results = exact;
            return Ok(response);
        }

        let type_filter = request.type_filter();
        let query_lower = request.text.to_lowercase();
        let mut candidates: Vec<Candidate> = self
            .entities
            .values()
            .filter(|e| type_filter.is_none_or(|t| e.has_type(t)))
            .filter_map(|e| {
                let score = heuristic_score(&query_lower, e) + type_bonus(type_filter, e);
                if score <= 0.0 || !matches_all(&filters, e) {
                    return None;
                }
                Some(Candidate::scored(e, score))
            })
            .collect();

        scoring::sort_candidates(&mut candidates);
        candidates.truncate(limit);
        response.results = candidates;
        Ok(response)
    }

    async fn query_prefix(&self, text: &str, limit: usize) -> Vec<Entity> {
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };

        let exact: Vec<Entity> = self.exact_key_matches(text).map(summary).take(limit).collect();
        if !exact.is_empty() {
            return exact;
        }

        let prefix = text.to_lowercase();
        let mut matches: Vec<&Entity> = self
            .entities
            .values()
            .filter(|e| {
                e.name.to_lowercase().starts_with(&prefix)
                    || e.raw_key().to_lowercase().starts_with(&prefix)
            })
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        debug!(prefix = %text, hits = matches.len(), limit, "Prefix query");
        matches.into_iter().take(limit).map(summary).collect()
    }
}
