//! Entity store backends and the factory that picks one.
//!
//! | Backend | Feature | Source |
//! |---------|---------|--------|
//! | [`memory::MemoryStore`] | always | flat intermediate file, optionally gzipped |
//! | `sqlite::SqliteStore` | `sqlite` (default) | pre-populated SQLite database with FTS5 |
//!
//! # Example
//!
//! ```no_run
//! use recon_persistence::backends::open_store;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = open_store("data/authors.sqlite")?;
//! println!("{} types", store.types().len());
//! # Ok(())
//! # }
//! ```

pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use crate::core::EntityStore;
use crate::error::StoreResult;

/// The kind of source a path points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLocation {
    /// A flat intermediate file, loaded into memory.
    FlatFile,
    /// An SQLite database.
    Sqlite,
}

impl StoreLocation {
    /// Classifies a path by its file name.
    ///
    /// Names containing `sqlite` or ending in `.db` are databases; anything
    /// else is a flat file.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains("sqlite") || name.ends_with(".db") {
            StoreLocation::Sqlite
        } else {
            StoreLocation::FlatFile
        }
    }
}

/// Opens the store for a data source, choosing the backend from the path.
pub fn open_store(path: impl AsRef<Path>) -> StoreResult<Arc<dyn EntityStore>> {
    let path = path.as_ref();
    let location = StoreLocation::detect(path);
    tracing::debug!(path = %path.display(), ?location, "Opening store");

    match location {
        StoreLocation::FlatFile => Ok(Arc::new(memory::MemoryStore::open(path)?)),
        #[cfg(feature = "sqlite")]
        StoreLocation::Sqlite => Ok(Arc::new(sqlite::SqliteStore::open(path)?)),
        #[cfg(not(feature = "sqlite"))]
        StoreLocation::Sqlite => Err(crate::error::StoreError::Backend(
            crate::error::BackendError::Unavailable {
                backend_name: "sqlite".to_string(),
                message: "built without the `sqlite` feature".to_string(),
            },
        )),
    }
}
