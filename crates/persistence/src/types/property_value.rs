//! Property values attached to entities.

use serde::{Deserialize, Serialize};

use super::EntityId;

/// The kind of value a property is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Free text (the default).
    #[default]
    String,
    /// Boolean flag.
    Boolean,
    /// Whole number.
    Integer,
    /// Floating point number.
    Float,
    /// Reference to another entity.
    Entity,
}

/// A reference from a property value to another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    /// Composite id of the referenced entity.
    pub id: EntityId,
    /// Display name of the referenced entity.
    pub name: String,
}

/// A single value of an entity property.
///
/// Values coerce loosely between representations so that callers can read
/// them the way the property's [`ValueKind`] suggests without caring how the
/// dataset spelled them.
///
/// # Examples
///
/// ```
/// use recon_persistence::types::PropertyValue;
///
/// assert!(PropertyValue::from("yes").as_bool());
/// assert_eq!(PropertyValue::Float(3.9).as_i64(), 3);
/// assert_eq!(PropertyValue::Boolean(true).as_string(), "true");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A boolean.
    Boolean(bool),
    /// A 64-bit integer.
    Integer(i64),
    /// A 64-bit float.
    Float(f64),
    /// A string.
    String(String),
    /// A reference to another entity.
    Entity(EntityRef),
}

impl PropertyValue {
    /// Converts a JSON value from a dataset into a property value.
    ///
    /// Returns `None` for nulls, arrays and objects that are not entity
    /// references (`{"id": ..., "name": ...}`).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Bool(b) => Some(PropertyValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(PropertyValue::Integer(i)),
                None => n.as_f64().map(PropertyValue::Float),
            },
            Value::String(s) => Some(PropertyValue::String(s.clone())),
            Value::Object(map) => {
                let id = map.get("id")?.as_str()?;
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(PropertyValue::Entity(EntityRef {
                    id: EntityId::new(id),
                    name: name.to_string(),
                }))
            }
            Value::Null | Value::Array(_) => None,
        }
    }

    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Boolean(_) => ValueKind::Boolean,
            PropertyValue::Integer(_) => ValueKind::Integer,
            PropertyValue::Float(_) => ValueKind::Float,
            PropertyValue::String(_) => ValueKind::String,
            PropertyValue::Entity(_) => ValueKind::Entity,
        }
    }

    /// Coerces the value into a string. Entity references yield their id.
    pub fn as_string(&self) -> String {
        match self {
            PropertyValue::Boolean(b) => b.to_string(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::String(s) => s.clone(),
            PropertyValue::Entity(e) => e.id.to_string(),
        }
    }

    /// Coerces the value into a boolean.
    ///
    /// Numbers are true when non-zero. Strings are true when they read
    /// `YES`, `TRUE`, `T`, `ON` or `1` in any case.
    pub fn as_bool(&self) -> bool {
        match self {
            PropertyValue::Boolean(b) => *b,
            PropertyValue::Integer(i) => *i != 0,
            PropertyValue::Float(f) => *f != 0.0,
            PropertyValue::String(s) => matches!(
                s.to_ascii_uppercase().as_str(),
                "YES" | "TRUE" | "T" | "ON" | "1"
            ),
            PropertyValue::Entity(_) => false,
        }
    }

    /// Coerces the value into an integer, or 0 when it has no integer reading.
    ///
    /// Floats are truncated. Strings and entity ids are parsed in base 10.
    pub fn as_i64(&self) -> i64 {
        match self {
            PropertyValue::Boolean(b) => i64::from(*b),
            PropertyValue::Integer(i) => *i,
            PropertyValue::Float(f) => *f as i64,
            PropertyValue::String(s) => s.parse().unwrap_or(0),
            PropertyValue::Entity(e) => e.id.as_str().parse().unwrap_or(0),
        }
    }

    /// Coerces the value into a float, or 0.0 when it has no numeric reading.
    pub fn as_f64(&self) -> f64 {
        match self {
            PropertyValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            PropertyValue::Integer(i) => *i as f64,
            PropertyValue::Float(f) => *f,
            PropertyValue::String(s) => s.parse().unwrap_or(0.0),
            PropertyValue::Entity(e) => e.id.as_str().parse().unwrap_or(0.0),
        }
    }

    /// Returns the referenced entity, if this value is a reference.
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            PropertyValue::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the string compared against query constraints.
    ///
    /// Entity references compare by the referenced raw key, not the
    /// composite id.
    pub fn match_key(&self) -> String {
        match self {
            PropertyValue::Entity(e) => e.id.raw_key().to_string(),
            other => other.as_string(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_bool() {
        for truthy in ["yes", "TRUE", "t", "On", "1"] {
            assert!(PropertyValue::from(truthy).as_bool(), "{truthy}");
        }
        for falsy in ["no", "0", "", "maybe"] {
            assert!(!PropertyValue::from(falsy).as_bool(), "{falsy}");
        }
        assert!(PropertyValue::Integer(-3).as_bool());
        assert!(!PropertyValue::Float(0.0).as_bool());
    }

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(PropertyValue::Boolean(true).as_i64(), 1);
        assert_eq!(PropertyValue::Float(-2.7).as_i64(), -2);
        assert_eq!(PropertyValue::from("1952").as_i64(), 1952);
        assert_eq!(PropertyValue::from("n/a").as_i64(), 0);
        assert_eq!(PropertyValue::Integer(4).as_f64(), 4.0);
        assert_eq!(PropertyValue::from("2.5").as_f64(), 2.5);
    }

    #[test]
    fn test_entity_reference() {
        let v = PropertyValue::from_json(&json!({"id": "city:c1", "name": "Cambridge"})).unwrap();
        assert_eq!(v.kind(), ValueKind::Entity);
        assert_eq!(v.as_string(), "city:c1");
        assert_eq!(v.match_key(), "c1");
        assert_eq!(v.as_entity().unwrap().name, "Cambridge");
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            PropertyValue::from_json(&json!(12)),
            Some(PropertyValue::Integer(12))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(1.5)),
            Some(PropertyValue::Float(1.5))
        );
        assert_eq!(PropertyValue::from_json(&json!(null)), None);
        assert_eq!(PropertyValue::from_json(&json!([1, 2])), None);
        assert_eq!(PropertyValue::from_json(&json!({"name": "x"})), None);
    }
}
