//! SQLite store construction and catalog loading.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::StoreMetadata;
use crate::error::{BackendError, StoreError, StoreResult};
use crate::loader::ResolvedDataset;
use crate::types::{Property, Type};

use super::schema::{self, ImportStats};

/// An entity store backed by a pre-populated SQLite database with FTS5.
///
/// Entities stay on disk and are searched through the full-text index. The
/// metadata, type catalog and property catalog are read once at open time
/// and cached. Connections are pooled and opened read-only.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteStoreConfig,
    pub(super) metadata: StoreMetadata,
    pub(super) types: HashMap<String, Arc<Type>>,
    pub(super) type_order: Vec<Arc<Type>>,
    pub(super) properties: HashMap<String, Vec<Arc<Property>>>,
}

impl Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("config", &self.config)
            .field("name", &self.metadata.name)
            .field("types", &self.types.len())
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl SqliteStore {
    /// Opens an existing store database with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::with_config(path, SqliteStoreConfig::default())
    }

    /// Opens an existing store database.
    ///
    /// Fails with [`BackendError::Unavailable`] when the file does not exist
    /// and with [`BackendError::SchemaError`] when tables are missing.
    pub fn with_config<P: AsRef<Path>>(path: P, config: SqliteStoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::Backend(BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: format!("database file not found: {}", path.display()),
            }));
        }

        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .with_init(move |conn| conn.busy_timeout(busy_timeout));

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(Some(config.min_connections))
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)
            .map_err(|e| {
                StoreError::Backend(BackendError::ConnectionFailed {
                    backend_name: "sqlite".to_string(),
                    message: e.to_string(),
                })
            })?;

        let mut store = Self {
            pool,
            config,
            metadata: StoreMetadata::default(),
            types: HashMap::new(),
            type_order: Vec::new(),
            properties: HashMap::new(),
        };
        store.load_catalogs()?;

        info!(
            path = %path.display(),
            name = %store.metadata.name,
            types = store.types.len(),
            properties = store.properties.values().map(Vec::len).sum::<usize>(),
            "Opened SQLite store"
        );
        Ok(store)
    }

    /// Creates (or extends) a store database at `path` from a resolved
    /// dataset and returns row counts.
    ///
    /// This is the only write path; stores opened afterwards are read-only.
    pub fn import<P: AsRef<Path>>(path: P, dataset: &ResolvedDataset) -> StoreResult<ImportStats> {
        let mut conn = Connection::open(path.as_ref())?;
        schema::import_dataset(&mut conn, dataset)
    }

    /// Get a connection from the pool.
    pub(crate) fn get_connection(&self) -> StoreResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            StoreError::Backend(BackendError::ConnectionFailed {
                backend_name: "sqlite".to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Reads metadata, types and properties into the resident caches.
    fn load_catalogs(&mut self) -> StoreResult<()> {
        let conn = self.get_connection()?;
        schema::verify_schema(&conn)?;

        let mut stmt = conn.prepare("SELECT meta_key, meta_value FROM recon_metadata")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            match key.as_str() {
                schema::META_NAME => self.metadata.name = value,
                schema::META_IDENTIFIER_NAMESPACE => self.metadata.identifier_namespace = value,
                schema::META_SCHEMA_NAMESPACE => self.metadata.schema_namespace = value,
                schema::META_VIEW_URL => self.metadata.view_url = value,
                _ => {}
            }
        }

        let mut stmt = conn.prepare(
            "SELECT type_id, type_name, COALESCE(type_description, ''), COALESCE(type_url, '')
             FROM recon_types ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Type {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                view_url: row.get(3)?,
            })
        })?;
        for row in rows {
            let ty = Arc::new(row?);
            self.types.insert(ty.id.clone(), Arc::clone(&ty));
            self.type_order.push(ty);
        }

        let mut links: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt =
            conn.prepare("SELECT prop_id, type_id FROM recon_props2types ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (prop_id, type_id) = row?;
            links.entry(prop_id).or_default().push(type_id);
        }

        let mut stmt = conn.prepare(
            "SELECT prop_id, prop_name, COALESCE(prop_description, '')
             FROM recon_properties ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            let mut property = Property::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?);
            property.description = row.get(2)?;
            Ok(property)
        })?;
        for row in rows {
            let property = Arc::new(row?);
            for type_id in links.get(&property.id).into_iter().flatten() {
                self.properties
                    .entry(type_id.clone())
                    .or_default()
                    .push(Arc::clone(&property));
            }
        }

        Ok(())
    }
}
