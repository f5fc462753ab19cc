//! Recon entity stores.
//!
//! This crate holds the matching engine of the recon reconciliation service:
//! a read-only collection of typed entities that answers free-text queries
//! with scored candidates, exact-id lookups and prefix suggestions.
//!
//! # Backends
//!
//! Two interchangeable engines implement [`EntityStore`](core::EntityStore):
//!
//! - [`MemoryStore`](backends::memory::MemoryStore) - everything resident,
//!   linear scan with a heuristic scorer
//! - `SqliteStore` (feature `sqlite`, on by default) - SQLite with an FTS5
//!   index, native ranks normalized onto the same scale
//!
//! Both produce the same candidate shape and the same match rule (score
//! strictly above 80), so the choice is a storage decision only.
//! [`open_store`](backends::open_store) picks one from the data source path.
//!
//! # Architecture
//!
//! - [`types`] - identifiers, entities, candidates, queries
//! - [`error`] - error types for all operations
//! - [`core`] - the store trait, scoring and constraint resolution
//! - [`loader`] - dataset records, their resolution, the flat file format
//! - [`backends`] - the in-memory and SQLite engines
//!
//! # Quick Start
//!
//! ```
//! use recon_persistence::backends::memory::MemoryStore;
//! use recon_persistence::core::EntityStore;
//! use recon_persistence::loader::parse_flat;
//! use recon_persistence::types::QueryRequest;
//!
//! let flat = "http://ex.org/id/\tAuthors\thttp://ex.org/schema/\t\
//!             [{\"id\":\"person\",\"name\":\"Person\"}]\n\
//!             q42\tDouglas Adams\tperson\t{}\n";
//! let store = MemoryStore::from_dataset(parse_flat(flat.as_bytes()).unwrap()).unwrap();
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let response = rt.block_on(store.query(&QueryRequest::new("q42"))).unwrap();
//! assert_eq!(response.results[0].id.as_str(), "person:q42");
//! assert!(response.results[0].is_match);
//! ```

#![warn(missing_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod loader;
pub mod types;

pub use error::{BackendError, LoadError, QueryError, StoreError, StoreResult};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
