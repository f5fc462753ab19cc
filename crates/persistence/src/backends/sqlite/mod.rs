//! SQLite full-text engine.
//!
//! Entities live in a pre-populated SQLite database and are searched through
//! an FTS5 index. Native bm25 ranks are mapped onto the heuristic score scale
//! so results are comparable with the in-memory engine. Property constraints
//! become joins built by [`search::EntitySearchBuilder`].
//!
//! # Example
//!
//! ```no_run
//! use recon_persistence::backends::sqlite::SqliteStore;
//! use recon_persistence::loader::{load_flat_file, resolve_dataset};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = resolve_dataset(load_flat_file("authors.tsv.gz")?)?;
//! SqliteStore::import("authors.sqlite", &dataset)?;
//!
//! let store = SqliteStore::open("authors.sqlite")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE recon_metadata (meta_key TEXT PRIMARY KEY, meta_value TEXT);
//! CREATE TABLE recon_types (type_id TEXT PRIMARY KEY, type_name TEXT,
//!     type_description TEXT, type_url TEXT);
//! CREATE TABLE recon_properties (prop_id TEXT PRIMARY KEY, prop_name TEXT,
//!     prop_description TEXT);
//! CREATE TABLE recon_props2types (prop_id TEXT, type_id TEXT);
//!
//! -- ent_types is the comma-joined type id list, primary type first
//! CREATE TABLE recon_entities (ent_types TEXT, ent_id TEXT, ent_name TEXT,
//!     ent_description TEXT, PRIMARY KEY (ent_id, ent_types));
//! CREATE TABLE recon_entity_properties (ent_types TEXT, ent_id TEXT,
//!     prop_id TEXT, prop_value TEXT);
//!
//! CREATE VIRTUAL TABLE recon_entities_fts USING fts5(
//!     ent_id, ent_name, ent_description, ent_types,
//!     content='recon_entities');
//! ```

mod backend;
pub mod schema;
pub mod search;
mod store_impl;

pub use backend::{SqliteStore, SqliteStoreConfig};
pub use schema::ImportStats;
