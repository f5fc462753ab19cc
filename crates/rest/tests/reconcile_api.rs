//! Reconciliation API tests.
//!
//! Tests the protocol endpoints over the in-memory engine:
//! - manifest, query batches and data extension at the root
//! - entity, type and property suggest
//! - property listing
//! - JSONP wrapping, CORS and error status codes

mod common;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use recon_rest::ServerConfig;
use serde_json::{Value, json};

use common::*;

const ORIGIN: HeaderName = HeaderName::from_static("origin");

// =============================================================================
// Manifest
// =============================================================================

mod manifest {
    use super::*;

    #[tokio::test]
    async fn test_manifest_describes_service() {
        let server = create_test_server();

        let response = server.get("/api").await;
        response.assert_status_ok();
        let body: Value = response.json();

        assert_eq!(body["versions"], json!(["0.1", "0.2"]));
        assert_eq!(body["name"], "Authors");
        assert_eq!(body["identifierSpace"], "http://example.org/id/");
        assert_eq!(body["schemaSpace"], "http://example.org/schema/");
        assert_eq!(body["defaultTypes"].as_array().unwrap().len(), 3);
        assert_eq!(body["defaultTypes"][0]["id"], "person");
        assert_eq!(body["view"]["url"], "https://example.org/view/{{id}}");
    }

    #[tokio::test]
    async fn test_manifest_service_definitions() {
        let server = create_test_server();

        let body: Value = server.get("/api").await.json();
        let suggest = &body["suggest"];
        for (key, path) in [
            ("entity", "/auto/entities"),
            ("type", "/auto/types"),
            ("property", "/auto/properties"),
        ] {
            assert_eq!(suggest[key]["service_url"], "http://localhost:8080/api");
            assert_eq!(suggest[key]["service_path"], path);
        }
        assert_eq!(
            body["extend"]["propose_properties"]["service_path"],
            "/properties"
        );
    }

    #[tokio::test]
    async fn test_manifest_on_post_without_parameters() {
        let server = create_test_server();

        let response = server.post("/api").form(&[("other", "x")]).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["name"], "Authors");
    }

    #[tokio::test]
    async fn test_root_prefix() {
        let config = ServerConfig {
            prefix: "/".to_string(),
            ..ServerConfig::for_testing()
        };
        let server = create_test_server_with(authors_store(), config);

        let body: Value = server.get("/").await.json();
        assert_eq!(body["name"], "Authors");
        assert_eq!(body["suggest"]["entity"]["service_url"], "http://localhost:8080");
        server.get("/auto/types").await.assert_status_ok();
    }
}

// =============================================================================
// Queries
// =============================================================================

mod queries {
    use super::*;

    fn batch() -> String {
        json!({
            "q0": {"query": "Douglas Adams"},
            "q1": {"query": "q43"},
            "q2": {"query": "Douglas", "type": "person", "limit": 1},
        })
        .to_string()
    }

    fn assert_batch(body: &Value) {
        let q0 = body["q0"]["result"].as_array().unwrap();
        assert_eq!(q0[0]["id"], "person:q42");
        assert_eq!(q0[0]["name"], "Douglas Adams");
        assert_eq!(q0[0]["match"], true);
        assert_eq!(q0[0]["type"][0]["id"], "person");

        let q1 = body["q1"]["result"].as_array().unwrap();
        assert_eq!(q1.len(), 1);
        assert_eq!(q1[0]["id"], "person:q43");
        assert_eq!(q1[0]["score"], 100.0);

        assert_eq!(body["q2"]["result"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_queries_over_get() {
        let server = create_test_server();

        let response = server.get("/api").add_query_param("queries", batch()).await;
        response.assert_status_ok();
        assert_batch(&response.json());
    }

    #[tokio::test]
    async fn test_queries_over_post_form() {
        let server = create_test_server();

        let queries = batch();
        let response = server
            .post("/api")
            .form(&[("queries", queries.as_str())])
            .await;
        response.assert_status_ok();
        assert_batch(&response.json());
    }

    #[tokio::test]
    async fn test_property_constraints() {
        let server = create_test_server();

        let queries = json!({
            "q0": {
                "query": "Douglas",
                "properties": [{"pid": "city", "v": {"id": "place:p1", "name": "Cambridge"}}]
            }
        });
        let body: Value = server
            .get("/api")
            .add_query_param("queries", queries.to_string())
            .await
            .json();
        let results = body["q0"]["result"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["id"], "person:q42");
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_list() {
        let server = create_test_server();

        let queries = json!({"q0": {"query": "Zaphod Beeblebrox"}});
        let body: Value = server
            .get("/api")
            .add_query_param("queries", queries.to_string())
            .await
            .json();
        assert_eq!(body["q0"]["result"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_constraint_is_400() {
        let server = create_test_server();

        let queries = json!({
            "q0": {"query": "Douglas", "properties": [{"pid": "born", "v": null}]}
        });
        let response = server
            .get("/api")
            .add_query_param("queries", queries.to_string())
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["status"], 400);
        assert!(body["message"].as_str().unwrap().contains("born"));
    }

    #[tokio::test]
    async fn test_unparsable_queries_is_400() {
        let server = create_test_server();

        let response = server
            .get("/api")
            .add_query_param("queries", "{not json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_503() {
        let server =
            create_test_server_with(Arc::new(UnavailableStore::default()), ServerConfig::for_testing());

        let queries = json!({"q0": {"query": "Douglas"}});
        let response = server
            .get("/api")
            .add_query_param("queries", queries.to_string())
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json();
        assert_eq!(body["status"], 503);
    }
}

// =============================================================================
// Data extension
// =============================================================================

mod extend {
    use super::*;

    #[tokio::test]
    async fn test_extend_returns_values() {
        let server = create_test_server();

        let request = json!({
            "ids": ["person:q42", "person:q43"],
            "properties": [{"id": "born"}, {"id": "city"}]
        });
        let response = server
            .get("/api")
            .add_query_param("extend", request.to_string())
            .await;
        response.assert_status_ok();
        let body: Value = response.json();

        assert_eq!(
            body["meta"],
            json!([{"id": "born", "name": "Year of birth"}, {"id": "city", "name": "City"}])
        );
        assert_eq!(body["rows"]["person:q42"]["born"], json!([{"str": "1952"}]));
        assert_eq!(body["rows"]["person:q42"]["city"], json!([{"str": "place:p1"}]));
        assert_eq!(body["rows"]["person:q43"]["born"], json!([{"str": "1945"}]));
        assert_eq!(body["rows"]["person:q43"]["city"], json!([]));
    }

    #[tokio::test]
    async fn test_extend_unknown_property_name_falls_back_to_id() {
        let server = create_test_server();

        let request = json!({"ids": ["book:b1"], "properties": [{"id": "isbn"}]});
        let body: Value = server
            .get("/api")
            .add_query_param("extend", request.to_string())
            .await
            .json();
        assert_eq!(body["meta"][0]["name"], "isbn");
        assert_eq!(body["rows"]["book:b1"]["isbn"], json!([]));
    }

    #[tokio::test]
    async fn test_extend_unknown_entity_is_404() {
        let server = create_test_server();

        let request = json!({"ids": ["person:q42", "person:q0"], "properties": [{"id": "born"}]});
        let response = server
            .post("/api")
            .form(&[("extend", request.to_string())])
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert!(body["message"].as_str().unwrap().contains("person:q0"));
    }
}

// =============================================================================
// Suggest and property listing
// =============================================================================

mod suggest {
    use super::*;

    #[tokio::test]
    async fn test_entity_suggest() {
        let server = create_test_server();

        let body: Value = server
            .get("/api/auto/entities")
            .add_query_param("prefix", "doug")
            .await
            .json();
        let names: Vec<&str> = body["result"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Douglas Adams", "Douglas Hofstadter"]);
    }

    #[tokio::test]
    async fn test_type_suggest_with_fallback() {
        let server = create_test_server();

        let body: Value = server
            .get("/api/auto/types")
            .add_query_param("prefix", "PL")
            .await
            .json();
        assert_eq!(body["result"], json!([{"id": "place", "name": "Place"}]));

        let body: Value = server
            .get("/api/auto/types")
            .add_query_param("prefix", "oo")
            .await
            .json();
        assert_eq!(body["result"][0]["id"], "book");
    }

    #[tokio::test]
    async fn test_property_suggest_deduplicates() {
        let server = create_test_server();

        let body: Value = server
            .get("/api/auto/properties")
            .add_query_param("prefix", "pub")
            .await
            .json();
        let result = body["result"].as_array().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["id"], "publisher");
    }

    #[tokio::test]
    async fn test_property_listing() {
        let server = create_test_server();

        let body: Value = server
            .get("/api/properties")
            .add_query_param("type", "person")
            .add_query_param("limit", "2")
            .await
            .json();
        assert_eq!(body["limit"], 2);
        assert_eq!(body["type"], "person");
        let ids: Vec<&str> = body["properties"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["born", "city"]);

        let body: Value = server
            .get("/api/properties")
            .add_query_param("type", "book")
            .add_query_param("limit", "lots")
            .await
            .json();
        assert_eq!(body["limit"], 0);
        assert_eq!(body["properties"].as_array().unwrap().len(), 2);

        let body: Value = server
            .get("/api/properties")
            .add_query_param("type", "nonexistent-type")
            .await
            .json();
        assert_eq!(body["properties"], json!([]));
    }
}

// =============================================================================
// JSONP and CORS
// =============================================================================

mod wrapping {
    use super::*;

    #[tokio::test]
    async fn test_jsonp_callback() {
        let server = create_test_server();

        let response = server
            .get("/api/auto/types")
            .add_query_param("prefix", "book")
            .add_query_param("callback", "jQuery123_cb")
            .await;
        response.assert_status_ok();

        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type.to_str().unwrap(), "application/javascript");

        let text = response.text();
        let json = text
            .strip_prefix("/**/jQuery123_cb(")
            .and_then(|t| t.strip_suffix(");"))
            .unwrap_or_else(|| panic!("not a JSONP body: {text}"));
        let body: Value = serde_json::from_str(json).unwrap();
        assert_eq!(body["result"][0]["id"], "book");
    }

    #[tokio::test]
    async fn test_jsonp_on_post() {
        let server = create_test_server();

        let queries = json!({"q0": {"query": "q42"}}).to_string();
        let response = server
            .post("/api")
            .add_query_param("callback", "cb")
            .form(&[("queries", queries.as_str())])
            .await;
        response.assert_status_ok();
        assert!(response.text().starts_with("/**/cb({"));
    }

    #[tokio::test]
    async fn test_invalid_callback_is_400() {
        let server = create_test_server();

        let response = server
            .get("/api")
            .add_query_param("callback", "alert(document.cookie)")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plain_json_content_type() {
        let server = create_test_server();

        let response = server.get("/api").await;
        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type.to_str().unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_cors_header() {
        let server = create_test_server();

        let response = server
            .get("/api")
            .add_header(ORIGIN, HeaderValue::from_static("http://127.0.0.1:3333"))
            .await;
        response.assert_status_ok();
        let allow = response
            .headers()
            .get("access-control-allow-origin")
            .expect("CORS header missing");
        assert_eq!(allow.to_str().unwrap(), "*");
    }

    #[tokio::test]
    async fn test_no_cors_header_when_disabled() {
        let config = ServerConfig {
            enable_cors: false,
            ..ServerConfig::for_testing()
        };
        let server = create_test_server_with(authors_store(), config);

        let response = server
            .get("/api")
            .add_header(ORIGIN, HeaderValue::from_static("http://127.0.0.1:3333"))
            .await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
