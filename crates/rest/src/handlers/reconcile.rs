//! Reconciliation root handler.
//!
//! `GET|POST [prefix]` serves three things depending on the parameters:
//!
//! - `queries` - a JSON map of query id to query, answered with candidates
//! - `extend` - a data extension request, answered with property values
//! - neither - the service manifest
//!
//! Parameters come from the query string for GET and from the
//! `application/x-www-form-urlencoded` body for POST.

use std::collections::{BTreeMap, HashMap};

use axum::{
    Form,
    extract::{Query, State},
    response::Response,
};
use recon_persistence::core::EntityStore;
use recon_persistence::types::{Candidate, EntityId, QueryRequest};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::responses::{CallbackParam, jsonp_response};
use crate::state::AppState;

/// Parameters of the root endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ReconcileParams {
    /// JSON map of query id to query.
    #[serde(default)]
    pub queries: Option<String>,

    /// JSON data extension request.
    #[serde(default)]
    pub extend: Option<String>,

    /// JSONP callback.
    #[serde(default)]
    pub callback: Option<String>,
}

/// Candidates answering one query of a batch.
#[derive(Debug, Serialize)]
pub struct QueryResultSet {
    /// Candidates ordered by descending score.
    pub result: Vec<Candidate>,
}

/// A data extension request.
#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    /// Composite ids of the entities to extend.
    pub ids: Vec<String>,

    /// The requested properties.
    #[serde(default)]
    pub properties: Vec<ExtendProperty>,
}

/// A property requested by an [`ExtendRequest`].
#[derive(Debug, Deserialize)]
pub struct ExtendProperty {
    /// The property id.
    pub id: String,

    /// Per-property settings. Accepted and ignored.
    #[serde(default)]
    pub settings: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A property described in the `meta` section of an extend response.
#[derive(Debug, Serialize)]
pub struct PropertyMeta {
    /// The property id.
    pub id: String,
    /// The property name.
    pub name: String,
}

/// A single property value cell.
#[derive(Debug, Serialize)]
pub struct ValueCell {
    /// The value as text.
    pub str: String,
}

/// The answer to an [`ExtendRequest`].
#[derive(Debug, Serialize)]
pub struct ExtendResponse {
    /// The requested properties, in request order.
    pub meta: Vec<PropertyMeta>,

    /// Entity id to property id to values.
    pub rows: BTreeMap<String, BTreeMap<String, Vec<ValueCell>>>,
}

/// Handler for the root endpoint, GET or POST.
///
/// # Response
///
/// - `200 OK` - candidates, extension rows or the manifest
/// - `400 Bad Request` - unparsable `queries`/`extend`, malformed constraint
///   or invalid callback
/// - `404 Not Found` - an extended entity does not exist
/// - `503 Service Unavailable` - the store cannot be reached
pub async fn reconcile_handler(
    State(state): State<AppState>,
    Query(query): Query<CallbackParam>,
    Form(params): Form<ReconcileParams>,
) -> RestResult<Response> {
    let callback = query
        .name()
        .or(params.callback.as_deref().filter(|c| !c.is_empty()));

    if let Some(raw) = params.queries.as_deref().filter(|q| !q.is_empty()) {
        let results = run_queries(state.store(), raw).await?;
        return jsonp_response(callback, &results);
    }

    if let Some(raw) = params.extend.as_deref().filter(|e| !e.is_empty()) {
        let request: ExtendRequest = serde_json::from_str(raw)
            .map_err(|e| RestError::bad_request(format!("invalid extend request: {}", e)))?;
        let response = extend(state.store(), &request).await?;
        return jsonp_response(callback, &response);
    }

    debug!("Serving manifest");
    jsonp_response(callback, state.manifest())
}

/// Answers a batch of queries, keyed by query id.
pub async fn run_queries(
    store: &dyn EntityStore,
    raw: &str,
) -> RestResult<BTreeMap<String, QueryResultSet>> {
    let queries: HashMap<String, QueryRequest> = serde_json::from_str(raw)
        .map_err(|e| RestError::bad_request(format!("invalid queries: {}", e)))?;
    debug!(count = queries.len(), "Processing query batch");

    let mut results = BTreeMap::new();
    for (query_id, mut request) in queries {
        request.id = query_id;
        let response = store.query(&request).await?;
        results.insert(
            response.id,
            QueryResultSet {
                result: response.results,
            },
        );
    }
    Ok(results)
}

/// Looks up a property name in the catalogs of all types.
fn property_name(store: &dyn EntityStore, property_id: &str) -> Option<String> {
    store.types().iter().find_map(|t| {
        store
            .properties_for(&t.id)
            .iter()
            .find(|p| p.id == property_id)
            .map(|p| p.name.clone())
    })
}

/// Fetches the requested property values of every requested entity.
///
/// Every requested property gets a key in each row, with an empty list when
/// the entity has no value for it.
pub async fn extend(store: &dyn EntityStore, request: &ExtendRequest) -> RestResult<ExtendResponse> {
    debug!(
        ids = request.ids.len(),
        properties = request.properties.len(),
        "Processing extend request"
    );

    let meta = request
        .properties
        .iter()
        .map(|p| {
            if p.settings.as_ref().is_some_and(|s| !s.is_empty()) {
                debug!(property_id = %p.id, "Ignoring property settings");
            }
            PropertyMeta {
                id: p.id.clone(),
                name: property_name(store, &p.id).unwrap_or_else(|| p.id.clone()),
            }
        })
        .collect();

    let mut rows = BTreeMap::new();
    for id in &request.ids {
        let entity = store
            .get_entity(&EntityId::new(id.as_str()))
            .await?
            .ok_or_else(|| RestError::NotFound { id: id.clone() })?;

        let row = request
            .properties
            .iter()
            .map(|p| {
                let cells = entity
                    .property_values(&p.id)
                    .iter()
                    .map(|v| ValueCell { str: v.as_string() })
                    .collect();
                (p.id.clone(), cells)
            })
            .collect();
        rows.insert(id.clone(), row);
    }

    Ok(ExtendResponse { meta, rows })
}
