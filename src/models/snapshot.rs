//! Entity snapshots
//!
//! A snapshot is the frozen field map of one entity at one instant, including
//! tracked many-to-many relations reduced to sorted comma-joined id lists.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Immutable field-name -> value mapping for one entity
///
/// Iteration follows insertion order, which is the order fields were read
/// from the store. Deltas are emitted in this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// Build a snapshot from an ordered field map
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the snapshot carries the field at all
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate fields in snapshot order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as the header payload: `{"<model>": { ...fields }}`
    pub fn to_json_object(&self, model: &str) -> Result<String, serde_json::Error> {
        let mut wrapper = Map::new();
        wrapper.insert(model.to_string(), Value::Object(self.0.clone()));
        serde_json::to_string(&Value::Object(wrapper))
    }

    /// Parse a header payload back into the model name and its snapshot
    pub fn from_json_object(json: &str) -> Result<Option<(String, Snapshot)>, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(match value {
            Value::Object(wrapper) => wrapper.into_iter().next().and_then(|(model, fields)| match fields {
                Value::Object(fields) => Some((model, Snapshot(fields))),
                _ => None,
            }),
            _ => None,
        })
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Render a field value the way it is stored in a delta row
///
/// Strings are kept verbatim, `null` becomes the empty string, and other
/// values use their compact JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
