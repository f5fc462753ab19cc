//! Common test utilities for reconciliation API testing.
//!
//! - a small authors dataset served from the in-memory engine
//! - a store whose backend is always unavailable
//! - test server construction
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;
use recon_persistence::backends::memory::MemoryStore;
use recon_persistence::core::{EntityStore, StoreMetadata};
use recon_persistence::error::{BackendError, StoreResult};
use recon_persistence::loader::parse_flat;
use recon_persistence::types::{Entity, EntityId, Property, QueryRequest, QueryResponse, Type};
use recon_rest::{ServerConfig, create_app};

/// Rows of the test dataset, header first.
const AUTHORS: &[[&str; 4]] = &[
    [
        "http://example.org/id/",
        "Authors",
        "http://example.org/schema/",
        r#"[{"id":"person","name":"Person","url":"https://example.org/view/%s"},{"id":"place","name":"Place"},{"id":"book","name":"Book"}]"#,
    ],
    ["born", "Year of birth", "property,person", "{}"],
    ["city", "City", "property,person", "{}"],
    ["pages", "Page count", "property,book", "{}"],
    ["publisher", "Publisher", "property,book,person", "{}"],
    [
        "q42",
        "Douglas Adams",
        "person",
        r#"{"born":1952,"city":{"id":"place:p1","name":"Cambridge"}}"#,
    ],
    ["q43", "Douglas Hofstadter", "person", r#"{"born":1945}"#],
    ["p1", "Cambridge", "place", "{}"],
    [
        "b1",
        "The Hitchhiker's Guide to the Galaxy",
        "book",
        r#"{"pages":224}"#,
    ],
];

/// Builds the in-memory store over the test dataset.
pub fn authors_store() -> Arc<dyn EntityStore> {
    let flat = AUTHORS
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n");
    let dataset = parse_flat(flat.as_bytes()).expect("Failed to parse dataset");
    Arc::new(MemoryStore::from_dataset(dataset).expect("Failed to build store"))
}

/// Creates a test server over the test dataset.
pub fn create_test_server() -> TestServer {
    create_test_server_with(authors_store(), ServerConfig::for_testing())
}

/// Creates a test server over a store with a configuration.
pub fn create_test_server_with(store: Arc<dyn EntityStore>, config: ServerConfig) -> TestServer {
    let app = create_app(store, config);
    TestServer::new(app).expect("Failed to create test server")
}

/// A store whose every lookup fails as unavailable.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    metadata: StoreMetadata,
}

fn unavailable() -> BackendError {
    BackendError::Unavailable {
        backend_name: "offline".to_string(),
        message: "database is offline".to_string(),
    }
}

#[async_trait]
impl EntityStore for UnavailableStore {
    fn backend_name(&self) -> &'static str {
        "offline"
    }

    fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    fn types(&self) -> Vec<Arc<Type>> {
        Vec::new()
    }

    fn properties_for(&self, _type_id: &str) -> Vec<Arc<Property>> {
        Vec::new()
    }

    async fn get_entity(&self, _id: &EntityId) -> StoreResult<Option<Entity>> {
        Err(unavailable().into())
    }

    async fn query(&self, _request: &QueryRequest) -> StoreResult<QueryResponse> {
        Err(unavailable().into())
    }

    async fn query_prefix(&self, _text: &str, _limit: usize) -> Vec<Entity> {
        Vec::new()
    }
}
