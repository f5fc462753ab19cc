//! Reconciliation query requests and responses.

use serde::{Deserialize, Serialize};

use super::Candidate;

/// Number of candidates returned when a request does not set a limit.
pub const DEFAULT_LIMIT: usize = 25;

/// A single reconciliation query.
///
/// # Examples
///
/// ```
/// use recon_persistence::types::QueryRequest;
///
/// let q: QueryRequest = serde_json::from_str(
///     r#"{"query": "Douglas Adams", "type": "person"}"#,
/// ).unwrap();
/// assert_eq!(q.type_filter(), Some("person"));
/// assert_eq!(q.effective_limit(), 25);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Caller-supplied correlation token, echoed in the response.
    #[serde(default)]
    pub id: String,

    /// The text to search for.
    #[serde(rename = "query", default)]
    pub text: String,

    /// Restricts candidates to entities holding this type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,

    /// Maximum number of candidates; 0 means [`DEFAULT_LIMIT`].
    #[serde(default)]
    pub limit: usize,

    /// Property value constraints, all of which must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<QueryProperty>,

    /// Type strictness hint (`any`, `all`, `should`). Accepted but not used
    /// for scoring.
    #[serde(rename = "type_strict", default, skip_serializing_if = "Option::is_none")]
    pub strictness: Option<String>,
}

impl QueryRequest {
    /// Creates a request for the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Sets the correlation id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the type constraint.
    pub fn with_type(mut self, type_id: impl Into<String>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    /// Sets the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Adds a property constraint.
    pub fn with_property(mut self, pid: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.push(QueryProperty {
            pid: pid.into(),
            v: value,
        });
        self
    }

    /// Returns the limit to apply, substituting the default for 0.
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    /// Returns the type constraint, treating an empty string as absent.
    pub fn type_filter(&self) -> Option<&str> {
        self.type_id.as_deref().filter(|t| !t.is_empty())
    }
}

/// A constraint on one property of the candidate entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryProperty {
    /// The property id.
    pub pid: String,

    /// The required value: a string, a number or boolean, or an entity
    /// reference `{"id": ..., "name": ...}`.
    pub v: serde_json::Value,
}

/// The ranked answer to a [`QueryRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The id of the request being answered.
    pub id: String,

    /// Candidates ordered by descending score.
    #[serde(rename = "result")]
    pub results: Vec<Candidate>,
}

impl QueryResponse {
    /// Creates an empty response for the given request.
    pub fn empty(request: &QueryRequest) -> Self {
        Self {
            id: request.id.clone(),
            results: Vec::new(),
        }
    }
}
