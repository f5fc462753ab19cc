//! In-memory store tests over the authors dataset.

mod common;

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use recon_persistence::backends::memory::MemoryStore;
use recon_persistence::backends::open_store;
use recon_persistence::core::EntityStore;
use recon_persistence::types::{EntityId, QueryRequest, ValueKind};
use serde_json::json;

use common::*;

fn create_store() -> (tempfile::TempDir, MemoryStore) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = memory_store(dir.path());
    (dir, store)
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_loads_catalogs_and_metadata() {
    let (_dir, store) = create_store();

    assert_eq!(store.len(), 8);
    assert_eq!(store.name(), "Authors");
    assert_eq!(store.identifier_namespace(), "http://example.org/id/");
    assert_eq!(store.schema_namespace(), "http://example.org/schema/");
    assert_eq!(store.view_url_template(), "https://example.org/view/{{id}}");

    let type_ids: Vec<String> = store.types().iter().map(|t| t.id.clone()).collect();
    assert_eq!(type_ids, vec!["person", "place", "book"]);

    let person_props: Vec<String> = store
        .properties_for("person")
        .iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(person_props, vec!["born", "city"]);
    assert_eq!(store.properties_for("book")[0].id, "genre");
    assert!(store.properties_for("nonexistent-type").is_empty());
}

#[test]
fn test_loads_gzipped_flat_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authors.tsv.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(authors_flat().as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let store = open_store(&path).unwrap();
    assert_eq!(store.backend_name(), "memory");
    assert_eq!(store.types().len(), 3);
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_get_entity_keeps_value_kinds() {
    let (_dir, store) = create_store();

    let adams = store
        .get_entity(&EntityId::new("person:q42"))
        .await
        .unwrap()
        .expect("q42 should exist");
    assert_eq!(adams.name, "Douglas Adams");
    assert_eq!(adams.description, "English writer");

    let born = adams.property_values("born");
    assert_eq!(born.len(), 1);
    assert_eq!(born[0].kind(), ValueKind::Integer);
    assert_eq!(born[0].as_i64(), 1952);

    let city = adams.property_values("city");
    let reference = city[0].as_entity().expect("city should be a reference");
    assert_eq!(reference.id.as_str(), "place:p1");
    assert_eq!(reference.name, "Cambridge");
}

#[tokio::test]
async fn test_get_entity_multi_valued_property() {
    let (_dir, store) = create_store();

    let book = store
        .get_entity(&EntityId::new("book:b1"))
        .await
        .unwrap()
        .unwrap();
    let genres: Vec<String> = book
        .property_values("genre")
        .iter()
        .map(|v| v.as_string())
        .collect();
    assert_eq!(genres, vec!["sf", "comedy"]);
}

#[tokio::test]
async fn test_get_entity_per_type_variant() {
    let (_dir, store) = create_store();

    let person = store
        .get_entity(&EntityId::new("person:x1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(person.property_values("born")[0].as_i64(), 1946);

    let place = store
        .get_entity(&EntityId::new("place:x1"))
        .await
        .unwrap()
        .unwrap();
    assert!(place.properties.is_empty());

    assert!(
        store
            .get_entity(&EntityId::new("book:x1"))
            .await
            .unwrap()
            .is_none()
    );
}

// ============================================================================
// Query
// ============================================================================

#[tokio::test]
async fn test_heuristic_scores() {
    let (_dir, store) = create_store();

    let response = store
        .query(&QueryRequest::new("douglas adams"))
        .await
        .unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].id.as_str(), "person:q42");
    assert_eq!(response.results[0].score, 100.0);
    assert!(response.results[0].is_match);

    // "douglas" covers 7 of the 12 characters of "Kirk Douglas"
    let response = store.query(&QueryRequest::new("Douglas")).await.unwrap();
    let kirk = response
        .results
        .iter()
        .find(|c| c.id.as_str() == "person:q44")
        .unwrap();
    assert!((kirk.score - 700.0 / 12.0).abs() < 1e-9);
    assert!(!kirk.is_match);
    assert_sorted_by_score(&response);
    assert_match_flags(&response);
}

#[tokio::test]
async fn test_type_bonus_lifts_matching_type() {
    let (_dir, store) = create_store();

    let response = store
        .query(&QueryRequest::new("Cambridge").with_type("place"))
        .await
        .unwrap();
    assert_eq!(response.results[0].id.as_str(), "place:p1");
    assert_eq!(response.results[0].score, 110.0);
    // other places hold the type but not the text
    assert_eq!(
        sorted_ids(&response),
        vec!["place:p1", "place:p2", "place:x1"]
    );
    assert!(response.results[1..].iter().all(|c| c.score == 10.0));
}

#[tokio::test]
async fn test_type_bonus_keeps_non_matching_names() {
    let (_dir, store) = create_store();

    let response = store
        .query(&QueryRequest::new("Douglas").with_type("person"))
        .await
        .unwrap();
    assert_eq!(response.results.len(), 4);
    let mercury = response.results.last().unwrap();
    assert_eq!(mercury.id.as_str(), "person:x1");
    assert_eq!(mercury.score, 10.0);
    assert!(!mercury.is_match);
    assert!(response.results.iter().all(|c| c.score >= 10.0));
    assert_sorted_by_score(&response);
}

#[tokio::test]
async fn test_entity_reference_constraint_by_raw_key() {
    let (_dir, store) = create_store();

    for value in [json!("p2"), json!({"id": "place:p2", "name": "New York"})] {
        let response = store
            .query(&QueryRequest::new("Douglas").with_property("city", value))
            .await
            .unwrap();
        assert_eq!(
            sorted_ids(&response),
            vec!["person:q43", "person:q44"],
            "constraint should match references and plain keys alike"
        );
    }
}

#[tokio::test]
async fn test_response_echoes_request_id() {
    let (_dir, store) = create_store();

    let response = store
        .query(&QueryRequest::new("nothing like this").with_id("q0"))
        .await
        .unwrap();
    assert_eq!(response.id, "q0");
    assert!(response.results.is_empty());
}
