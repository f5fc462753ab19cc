//! The shared test dataset and helpers that build stores from it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use recon_persistence::backends::memory::MemoryStore;
use recon_persistence::backends::sqlite::SqliteStore;
use recon_persistence::core::EntityStore;
use recon_persistence::loader::{load_flat_file, resolve_dataset};
use tempfile::TempDir;

/// Rows of the authors dataset, header first.
const AUTHORS: &[[&str; 4]] = &[
    [
        "http://example.org/id/",
        "Authors",
        "http://example.org/schema/",
        r#"[{"id":"person","name":"Person","url":"https://example.org/view/{{id}}"},{"id":"place","name":"Place"},{"id":"book","name":"Book","description":"A published work"}]"#,
    ],
    ["born", "Year of birth", "property,person", r#"{"description":"Year the person was born"}"#],
    ["city", "City", "property,person", "{}"],
    ["genre", "Genre", "property,book", "{}"],
    [
        "q42",
        "Douglas Adams",
        "person",
        r#"{"description":"English writer","born":1952,"city":{"id":"place:p1","name":"Cambridge"}}"#,
    ],
    [
        "q43",
        "Douglas Hofstadter",
        "person",
        r#"{"born":1945,"city":{"id":"place:p2","name":"New York"}}"#,
    ],
    ["q44", "Kirk Douglas", "person", r#"{"born":1916,"city":"p2"}"#],
    ["p1", "Cambridge", "place", "{}"],
    ["p2", "New York", "place", "{}"],
    [
        "b1",
        "The Hitchhiker's Guide to the Galaxy",
        "book",
        r#"{"genre":["sf","comedy"]}"#,
    ],
    ["x1", "Mercury", "person", r#"{"born":1946}"#],
    ["x1", "Mercury", "place", "{}"],
];

/// Joins dataset rows into flat file text.
pub fn flat_text(rows: &[[&str; 4]]) -> String {
    rows.iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The authors dataset as flat file text.
pub fn authors_flat() -> String {
    flat_text(AUTHORS)
}

/// Writes the authors dataset into `dir` and returns its path.
pub fn write_authors_flat(dir: &Path) -> PathBuf {
    write_flat(dir, AUTHORS)
}

/// Writes dataset rows into `dir` and returns the flat file path.
pub fn write_flat(dir: &Path, rows: &[[&str; 4]]) -> PathBuf {
    let path = dir.join("authors.tsv");
    std::fs::write(&path, flat_text(rows)).expect("Failed to write flat file");
    path
}

/// Builds an in-memory store over the authors dataset.
pub fn memory_store(dir: &Path) -> MemoryStore {
    MemoryStore::open(write_authors_flat(dir)).expect("Failed to load memory store")
}

/// Imports the authors dataset into a new SQLite database and opens it.
pub fn sqlite_store(dir: &Path) -> SqliteStore {
    import_sqlite(dir, write_authors_flat(dir))
}

fn import_sqlite(dir: &Path, flat: PathBuf) -> SqliteStore {
    let dataset = resolve_dataset(load_flat_file(flat).unwrap()).unwrap();
    let db = dir.join("authors.sqlite");
    SqliteStore::import(&db, &dataset).expect("Failed to import dataset");
    SqliteStore::open(&db).expect("Failed to open SQLite store")
}

/// Both engines over the same dataset. Keep the directory alive while the
/// stores are in use.
pub fn all_stores() -> (TempDir, Vec<Arc<dyn EntityStore>>) {
    stores_over(AUTHORS)
}

/// Both engines over the given dataset rows.
pub fn stores_over(rows: &[[&str; 4]]) -> (TempDir, Vec<Arc<dyn EntityStore>>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let flat = write_flat(dir.path(), rows);
    let stores: Vec<Arc<dyn EntityStore>> = vec![
        Arc::new(MemoryStore::open(&flat).expect("Failed to load memory store")),
        Arc::new(import_sqlite(dir.path(), flat)),
    ];
    (dir, stores)
}
