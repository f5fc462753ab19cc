//! The entity store capability.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::types::{Entity, EntityId, Property, QueryRequest, QueryResponse, Type};

/// Static metadata describing a dataset, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetadata {
    /// Human-readable name of the dataset.
    pub name: String,

    /// Namespace URI for entity identifiers.
    pub identifier_namespace: String,

    /// Namespace URI for type identifiers.
    pub schema_namespace: String,

    /// View-URL template for entities, empty when there is none.
    #[serde(default)]
    pub view_url: String,
}

/// A searchable, read-only collection of typed entities.
///
/// Implementations are constructed once and never mutated afterwards, so a
/// store can be shared between request handlers behind an `Arc` without any
/// locking. All backends must produce the same observable results for the
/// same dataset: the choice of backend is a storage decision only.
///
/// # Example
///
/// ```ignore
/// use recon_persistence::core::EntityStore;
/// use recon_persistence::types::QueryRequest;
///
/// async fn best_match(store: &dyn EntityStore, text: &str) -> Option<String> {
///     let response = store.query(&QueryRequest::new(text)).await.ok()?;
///     response.results.into_iter().find(|c| c.is_match).map(|c| c.name)
/// }
/// ```
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short name of the storage engine, for logs.
    fn backend_name(&self) -> &'static str;

    /// Returns the dataset metadata.
    fn metadata(&self) -> &StoreMetadata;

    /// Human-readable name of the dataset.
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Namespace URI for entity identifiers.
    fn identifier_namespace(&self) -> &str {
        &self.metadata().identifier_namespace
    }

    /// Namespace URI for type identifiers.
    fn schema_namespace(&self) -> &str {
        &self.metadata().schema_namespace
    }

    /// View-URL template for entities, empty when there is none.
    fn view_url_template(&self) -> &str {
        &self.metadata().view_url
    }

    /// Returns all known types, in no particular order.
    fn types(&self) -> Vec<Arc<Type>>;

    /// Returns the properties declared for a type.
    ///
    /// Unknown type ids yield an empty list.
    fn properties_for(&self, type_id: &str) -> Vec<Arc<Property>>;

    /// Looks up an entity by composite id, with its property values.
    ///
    /// Returns `None` when the raw key is unknown or when none of the stored
    /// entity's types matches the id's type prefix.
    async fn get_entity(&self, id: &EntityId) -> StoreResult<Option<Entity>>;

    /// Answers a reconciliation query.
    ///
    /// An exact raw-key match short-circuits with score 100 candidates.
    /// Otherwise candidates are scored by text similarity, filtered by the
    /// requested type and property constraints, ordered by descending score
    /// and truncated to the request limit. No match is an empty response,
    /// not an error.
    async fn query(&self, request: &QueryRequest) -> StoreResult<QueryResponse>;

    /// Finds entities whose name or raw key starts with `text`.
    ///
    /// Failures are logged and produce an empty list. A `limit` of 0 means
    /// the default limit.
    async fn query_prefix(&self, text: &str, limit: usize) -> Vec<Entity>;
}
