//! Suggest (auto-completion) handlers.
//!
//! - `GET [prefix]/auto/entities?prefix=` - entities by name or key prefix
//! - `GET [prefix]/auto/types?prefix=` - types by name
//! - `GET [prefix]/auto/properties?prefix=` - properties by name
//!
//! Type and property suggestions match names case-insensitively by prefix,
//! and fall back to substring matches when no name starts with the text.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Response,
};
use recon_persistence::core::EntityStore;
use recon_persistence::types::{Property, Type};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RestResult;
use crate::responses::jsonp_response;
use crate::state::AppState;

/// Query parameters of the suggest endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SuggestParams {
    /// The text typed so far.
    #[serde(default)]
    pub prefix: String,

    /// JSONP callback.
    #[serde(default)]
    pub callback: Option<String>,
}

impl SuggestParams {
    fn callback(&self) -> Option<&str> {
        self.callback.as_deref().filter(|c| !c.is_empty())
    }
}

/// A suggest response.
#[derive(Debug, Serialize)]
pub struct SuggestResponse<T> {
    /// The suggestions.
    pub result: Vec<T>,
}

/// Items with a display name that suggestions are matched against.
trait Named {
    fn name(&self) -> &str;
}

impl Named for Arc<Type> {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Arc<Property> {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Keeps the items whose name starts with `prefix`, or contains it when
/// none starts with it. Matching ignores case and keeps the input order.
fn match_names<T: Named + Clone>(items: &[T], prefix: &str) -> Vec<T> {
    let needle = prefix.to_lowercase();
    let starts: Vec<T> = items
        .iter()
        .filter(|item| item.name().to_lowercase().starts_with(&needle))
        .cloned()
        .collect();
    if !starts.is_empty() {
        return starts;
    }
    items
        .iter()
        .filter(|item| item.name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// All properties of all types, first declaration of each id wins.
fn all_properties(store: &dyn EntityStore) -> Vec<Arc<Property>> {
    let mut seen = HashSet::new();
    store
        .types()
        .iter()
        .flat_map(|t| store.properties_for(&t.id))
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

/// Handler for entity suggestions.
pub async fn suggest_entities_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> RestResult<Response> {
    let result = state
        .store()
        .query_prefix(&params.prefix, state.suggest_limit())
        .await;
    debug!(prefix = %params.prefix, hits = result.len(), "Entity suggest");
    jsonp_response(params.callback(), &SuggestResponse { result })
}

/// Handler for type suggestions.
pub async fn suggest_types_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> RestResult<Response> {
    let result = match_names(&state.store().types(), &params.prefix);
    debug!(prefix = %params.prefix, hits = result.len(), "Type suggest");
    jsonp_response(params.callback(), &SuggestResponse { result })
}

/// Handler for property suggestions.
pub async fn suggest_properties_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> RestResult<Response> {
    let result = match_names(&all_properties(state.store()), &params.prefix);
    debug!(prefix = %params.prefix, hits = result.len(), "Property suggest");
    jsonp_response(params.callback(), &SuggestResponse { result })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(names: &[&str]) -> Vec<Arc<Type>> {
        names
            .iter()
            .map(|n| Arc::new(Type::new(n.to_lowercase(), *n)))
            .collect()
    }

    #[test]
    fn test_prefix_matches_ignore_case() {
        let hits = match_names(&types(&["Person", "Place", "Book"]), "p");
        let names: Vec<&str> = hits.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Person", "Place"]);
    }

    #[test]
    fn test_substring_fallback() {
        let hits = match_names(&types(&["Person", "Place", "Book"]), "oo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Book");
    }

    #[test]
    fn test_prefix_hits_suppress_fallback() {
        let hits = match_names(&types(&["Acre", "Place"]), "ac");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Acre");
    }

    #[test]
    fn test_empty_prefix_matches_all() {
        assert_eq!(match_names(&types(&["Person", "Place"]), "").len(), 2);
    }
}
