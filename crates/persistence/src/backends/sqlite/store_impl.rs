//! [`EntityStore`] implementation for the SQLite store.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{Connection, Row, params};
use tracing::{debug, warn};

use crate::core::scoring::{self, EXACT_KEY_SCORE, ScoreNormalizer};
use crate::core::{EntityStore, StoreMetadata, resolve_filters};
use crate::error::StoreResult;
use crate::types::{
    Candidate, DEFAULT_LIMIT, Entity, EntityId, Property, PropertyMap, PropertyValue,
    QueryRequest, QueryResponse, Type,
};

use super::SqliteStore;
use super::schema::TYPE_LIST_SEPARATOR;
use super::search::{EntitySearchBuilder, match_expression};

const ENTITY_COLUMNS: &str =
    "ent_id, ent_name, COALESCE(ent_description, ''), ent_types FROM recon_entities";

/// An entity row together with its stored type list.
struct EntityRow {
    entity: Entity,
    type_list: String,
}

/// Escapes `%`, `_` and the escape character for a `LIKE ... ESCAPE '\'`
/// pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl SqliteStore {
    fn resolve_type(&self, type_id: &str) -> Arc<Type> {
        self.types
            .get(type_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(Type::new(type_id, type_id)))
    }

    /// Builds an entity from its raw key and stored type list. The composite
    /// id uses the first listed type.
    fn make_entity(&self, raw_key: &str, name: String, description: String, type_list: &str) -> Entity {
        let types: Vec<Arc<Type>> = type_list
            .split(TYPE_LIST_SEPARATOR)
            .filter(|t| !t.is_empty())
            .map(|t| self.resolve_type(t))
            .collect();
        let primary = types.first().map(|t| t.id.as_str()).unwrap_or_default();
        Entity {
            id: EntityId::compose(primary, raw_key),
            name,
            description,
            types,
            properties: PropertyMap::new(),
        }
    }

    fn entity_row(&self, row: &Row<'_>) -> rusqlite::Result<EntityRow> {
        let raw_key: String = row.get(0)?;
        let type_list: String = row.get(3)?;
        let entity = self.make_entity(&raw_key, row.get(1)?, row.get(2)?, &type_list);
        Ok(EntityRow { entity, type_list })
    }

    /// All entities stored under a raw key, one per type list.
    fn exact_key_matches(&self, conn: &Connection, raw_key: &str) -> StoreResult<Vec<EntityRow>> {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {ENTITY_COLUMNS} WHERE ent_id = ?1 ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([raw_key], |row| self.entity_row(row))?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn property_values(&self, conn: &Connection, row: &EntityRow) -> StoreResult<PropertyMap> {
        let mut stmt = conn.prepare_cached(
            "SELECT prop_id, prop_value FROM recon_entity_properties
             WHERE ent_types = ?1 AND ent_id = ?2 ORDER BY prop_id, prop_value",
        )?;
        let rows = stmt.query_map(params![row.type_list, row.entity.raw_key()], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;

        let mut properties = PropertyMap::new();
        for row in rows {
            let (prop_id, value) = row?;
            properties
                .entry(prop_id)
                .or_default()
                .push(PropertyValue::String(value));
        }
        Ok(properties)
    }

    fn prefix_matches(&self, text: &str, limit: usize) -> StoreResult<Vec<Entity>> {
        let conn = self.get_connection()?;

        let exact: Vec<Entity> = self
            .exact_key_matches(&conn, text)?
            .into_iter()
            .map(|r| r.entity)
            .take(limit)
            .collect();
        if !exact.is_empty() {
            return Ok(exact);
        }

        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {ENTITY_COLUMNS}
             WHERE ent_id LIKE ?1 ESCAPE '\\' OR ent_name LIKE ?1 ESCAPE '\\'
             ORDER BY ent_name, ent_id LIMIT ?2"
        ))?;
        let pattern = format!("{}%", escape_like(text));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![pattern, limit], |row| {
            self.entity_row(row).map(|r| r.entity)
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    fn types(&self) -> Vec<Arc<Type>> {
        self.type_order.clone()
    }

    fn properties_for(&self, type_id: &str) -> Vec<Arc<Property>> {
        self.properties.get(type_id).cloned().unwrap_or_default()
    }

    async fn get_entity(&self, id: &EntityId) -> StoreResult<Option<Entity>> {
        let conn = self.get_connection()?;
        let (type_id, raw_key) = id.split();
        let rows = self.exact_key_matches(&conn, raw_key)?;

        let found = rows
            .iter()
            .position(|r| r.entity.id == *id)
            .or_else(|| rows.iter().position(|r| r.entity.has_type(type_id)));
        let Some(index) = found else {
            debug!(entity_id = %id, found = false, "Entity lookup");
            return Ok(None);
        };

        let row = &rows[index];
        let mut entity = row.entity.clone();
        entity.properties = self.property_values(&conn, row)?;
        debug!(entity_id = %id, found = true, "Entity lookup");
        Ok(Some(entity))
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
            "Querying SQLite store"
        );

        let mut response = QueryResponse::empty(request);
        let conn = self.get_connection()?;

        let exact: Vec<Candidate> = self
            .exact_key_matches(&conn, &request.text)?
            .iter()
            .map(|r| Candidate::scored(&r.entity, EXACT_KEY_SCORE))
            .take(limit)
            .collect();
        if !exact.is_empty() {
            debug!(query_id = %request.id, hits = exact.len(), "Exact key match");
            response.results = exact;
            return Ok(response);
        }

        let Some(term) = match_expression(&request.text) else {
            return Ok(response);
        };
        let fragment = EntitySearchBuilder::new(&term)
            .with_filters(&filters)
            .build();

        let mut stmt = conn.prepare_cached(&fragment.sql)?;
        let mut rows = stmt.query(fragment.bind_params().as_slice())?;

        let type_filter = request.type_filter();
        let mut normalizer = ScoreNormalizer::new(&request.text);
        while let Some(row) = rows.next()? {
            let raw_key: String = row.get(0)?;
            let name: String = row.get(1)?;
            let type_list: String = row.get(2)?;
            let native: f64 = row.get(3)?;

            let entity = self.make_entity(&raw_key, name, String::new(), &type_list);
            if type_filter.is_some_and(|t| !entity.has_type(t)) {
                continue;
            }
            let score = normalizer.normalize(entity.id.as_str(), &entity.name, native);
            response.results.push(Candidate::scored(&entity, score));
            if response.results.len() == limit {
                break;
            }
        }

        scoring::sort_candidates(&mut response.results);
        debug!(
            query_id = %request.id,
            hits = response.results.len(),
            scale = ?normalizer.scale(),
            "Full-text search complete"
        );
        Ok(response)
    }

    async fn query_prefix(&self, text: &str, limit: usize) -> Vec<Entity> {
        let limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        match self.prefix_matches(text, limit) {
            Ok(entities) => {
                debug!(prefix = %text, hits = entities.len(), limit, "Prefix query");
                entities
            }
            Err(e) => {
                warn!(prefix = %text, error = %e, "Prefix query failed");
                Vec::new()
            }
        }
    }
}
