//! Property constraints of a query, resolved to comparable values.

use serde_json::Value;

use crate::error::QueryError;
use crate::types::{Entity, EntityId, PropertyValue, QueryProperty};

/// An equality filter on one property, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    /// Property id.
    pub property_id: String,
    /// Value the property must hold, in its stored string form.
    pub value: String,
}

impl PropertyFilter {
    /// Returns `true` if any value of the entity's property equals the filter
    /// value.
    pub fn matches(&self, entity: &Entity) -> bool {
        entity
            .property_values(&self.property_id)
            .iter()
            .any(|v| v.match_key() == self.value)
    }
}

/// Resolves query constraints into filters, keeping their order.
///
/// Strings are compared as given, numbers and booleans in the form stored
/// values take (so `1.0` and a stored float `1` compare equal),
/// and entity references (`{"id": ...}`) by the raw key of the referenced id.
/// Anything else makes the whole query fail.
pub fn resolve_filters(properties: &[QueryProperty]) -> Result<Vec<PropertyFilter>, QueryError> {
    properties
        .iter()
        .map(|p| {
            Ok(PropertyFilter {
                property_id: p.pid.clone(),
                value: constraint_value(p)?,
            })
        })
        .collect()
}

fn constraint_value(property: &QueryProperty) -> Result<String, QueryError> {
    let malformed = |message: &str| QueryError::MalformedConstraint {
        property_id: property.pid.clone(),
        message: message.to_string(),
    };

    match &property.v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) | Value::Bool(_) => PropertyValue::from_json(&property.v)
            .map(|v| v.match_key())
            .ok_or_else(|| malformed("number out of range")),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(id)) => Ok(EntityId::new(id.as_str()).raw_key().to_string()),
            _ => Err(malformed("entity reference without a string \"id\"")),
        },
        Value::Array(_) => Err(malformed("expected a single value, got an array")),
        Value::Null => Err(malformed("value is null")),
    }
}

/// Returns `true` if the entity satisfies every filter.
pub fn matches_all(filters: &[PropertyFilter], entity: &Entity) -> bool {
    filters.iter().all(|f| f.matches(entity))
}
