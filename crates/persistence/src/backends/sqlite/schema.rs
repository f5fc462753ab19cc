//! SQLite schema definitions and dataset import.

use rusqlite::{Connection, params};
use tracing::info;

use crate::error::{BackendError, StoreError, StoreResult};
use crate::loader::ResolvedDataset;

use super::search::fts;

/// Tables a store database must contain.
pub const REQUIRED_TABLES: &[&str] = &[
    "recon_metadata",
    "recon_types",
    "recon_properties",
    "recon_props2types",
    "recon_entities",
    "recon_entity_properties",
    fts::FTS_TABLE,
];

/// Metadata key of the dataset name.
pub const META_NAME: &str = "name";
/// Metadata key of the identifier namespace.
pub const META_IDENTIFIER_NAMESPACE: &str = "identifierNamespace";
/// Metadata key of the schema namespace.
pub const META_SCHEMA_NAMESPACE: &str = "schemaNamespace";
/// Metadata key of the view-URL template.
pub const META_VIEW_URL: &str = "view_url";

/// Separator of the type ids stored in `ent_types`.
pub const TYPE_LIST_SEPARATOR: char = ',';

fn schema_error(message: impl Into<String>) -> StoreError {
    StoreError::Backend(BackendError::SchemaError {
        message: message.into(),
    })
}

fn internal_error(message: String) -> StoreError {
    StoreError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

/// Creates all tables that do not exist yet.
pub fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS recon_metadata (
            meta_key TEXT NOT NULL PRIMARY KEY,
            meta_value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recon_types (
            type_id TEXT NOT NULL PRIMARY KEY,
            type_name TEXT NOT NULL,
            type_description TEXT,
            type_url TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS recon_properties (
            prop_id TEXT NOT NULL PRIMARY KEY,
            prop_name TEXT NOT NULL,
            prop_description TEXT
        );

        CREATE TABLE IF NOT EXISTS recon_props2types (
            prop_id TEXT NOT NULL,
            type_id TEXT NOT NULL,
            PRIMARY KEY (prop_id, type_id)
        );

        CREATE TABLE IF NOT EXISTS recon_entities (
            ent_types TEXT NOT NULL,
            ent_id TEXT NOT NULL,
            ent_name TEXT NOT NULL,
            ent_description TEXT,
            PRIMARY KEY (ent_id, ent_types)
        );

        CREATE TABLE IF NOT EXISTS recon_entity_properties (
            ent_types TEXT NOT NULL,
            ent_id TEXT NOT NULL,
            prop_id TEXT NOT NULL,
            prop_value TEXT NOT NULL,
            PRIMARY KEY (ent_types, ent_id, prop_id, prop_value)
        );

        CREATE INDEX IF NOT EXISTS idx_recon_entity_properties_value
            ON recon_entity_properties(prop_id, prop_value);
        "#,
    )
    .map_err(|e| internal_error(format!("Failed to create schema: {}", e)))?;

    conn.execute_batch(fts::create_table_sql())
        .map_err(|e| internal_error(format!("Failed to create FTS5 table: {}", e)))?;

    Ok(())
}

/// Checks that every required table exists.
pub fn verify_schema(conn: &Connection) -> StoreResult<()> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE name = ?1")?;
    let mut missing = Vec::new();
    for table in REQUIRED_TABLES {
        if !stmt.exists([table])? {
            missing.push(*table);
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(schema_error(format!(
            "missing tables: {}",
            missing.join(", ")
        )))
    }
}

/// Row counts written by [`import_dataset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Types written.
    pub types: usize,
    /// Properties written.
    pub properties: usize,
    /// Entities written.
    pub entities: usize,
    /// Property values written.
    pub values: usize,
}

/// Writes a resolved dataset in a single transaction and rebuilds the
/// full-text index.
///
/// Entity-reference values are stored as the referenced raw key.
pub fn import_dataset(conn: &mut Connection, dataset: &ResolvedDataset) -> StoreResult<ImportStats> {
    initialize_schema(conn)?;

    let tx = conn.transaction()?;
    let mut stats = ImportStats::default();
    {
        let metadata = &dataset.metadata;
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO recon_metadata (meta_key, meta_value) VALUES (?1, ?2)",
        )?;
        for (key, value) in [
            (META_NAME, &metadata.name),
            (META_IDENTIFIER_NAMESPACE, &metadata.identifier_namespace),
            (META_SCHEMA_NAMESPACE, &metadata.schema_namespace),
            (META_VIEW_URL, &metadata.view_url),
        ] {
            stmt.execute(params![key, value])?;
        }

        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO recon_types (type_id, type_name, type_description, type_url)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for ty in &dataset.types {
            stmt.execute(params![ty.id, ty.name, ty.description, ty.view_url])?;
            stats.types += 1;
        }

        let mut prop_stmt = tx.prepare(
            "INSERT OR IGNORE INTO recon_properties (prop_id, prop_name, prop_description)
             VALUES (?1, ?2, ?3)",
        )?;
        let mut link_stmt = tx.prepare(
            "INSERT OR IGNORE INTO recon_props2types (prop_id, type_id) VALUES (?1, ?2)",
        )?;
        for resolved in &dataset.properties {
            let p = &resolved.property;
            stats.properties += prop_stmt.execute(params![p.id, p.name, p.description])?;
            for type_id in &resolved.type_ids {
                link_stmt.execute(params![p.id, type_id])?;
            }
        }

        let mut entity_stmt = tx.prepare(
            "INSERT OR REPLACE INTO recon_entities (ent_types, ent_id, ent_name, ent_description)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut value_stmt = tx.prepare(
            "INSERT OR IGNORE INTO recon_entity_properties (ent_types, ent_id, prop_id, prop_value)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for entity in &dataset.entities {
            let type_list = entity
                .types
                .iter()
                .map(|t| t.id.as_str())
                .collect::<Vec<_>>()
                .join(&TYPE_LIST_SEPARATOR.to_string());
            let raw_key = entity.raw_key();
            entity_stmt.execute(params![type_list, raw_key, entity.name, entity.description])?;
            stats.entities += 1;

            for (prop_id, values) in &entity.properties {
                for value in values {
                    stats.values +=
                        value_stmt.execute(params![type_list, raw_key, prop_id, value.match_key()])?;
                }
            }
        }
    }

    tx.execute(&fts::rebuild_index_sql(), [])
        .map_err(|e| internal_error(format!("Failed to rebuild FTS5 index: {}", e)))?;
    tx.commit()?;

    info!(
        types = stats.types,
        properties = stats.properties,
        entities = stats.entities,
        values = stats.values,
        "Imported dataset into SQLite"
    );
    Ok(stats)
}
