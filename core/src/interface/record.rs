use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LATITUDE_FIELD: &str = "latitude";
pub const LONGITUDE_FIELD: &str = "longitude";
pub const SEVERITY_FIELD: &str = "severity";

/// Schemaless document as returned by a point source.
///
/// Every field is optional; nothing about its shape is trusted until it has been
/// through the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Builds a record from a flat JSON object, taking the id from its `id` member
    /// when present and falling back to `fallback_id` otherwise.
    pub fn from_object(mut object: Map<String, Value>, fallback_id: impl Into<String>) -> Self {
        let id = match object.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            Some(other) => {
                object.insert("id".into(), other);
                fallback_id.into()
            }
            None => fallback_id.into(),
        };
        Self { id, fields: object }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Numeric value of `field`; strings, booleans and nulls are not numbers.
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field) {
            Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    pub fn latitude(&self) -> Option<f64> {
        self.number(LATITUDE_FIELD)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.number(LONGITUDE_FIELD)
    }

    pub fn severity(&self) -> Option<f64> {
        self.number(SEVERITY_FIELD)
    }
}
