//! Entity record model
//!
//! The persisted shape of an audited business object: a primary key, an
//! ordered field map, and the ids attached through many-to-many relations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A persisted entity as seen by the audit engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Primary key
    pub id: String,

    /// Field name -> value, in declaration order
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// Many-to-many relation name -> related ids
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Vec<String>>,
}

impl EntityRecord {
    /// Create an empty record with the given primary key
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style relation setter
    pub fn with_relation<I, S>(mut self, name: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link(name, ids);
        self
    }

    /// Set a field value, keeping its original position if it already exists
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Remove a field, returning its previous value
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Replace the related ids of a many-to-many relation
    pub fn link<I, S>(&mut self, name: impl Into<String>, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations
            .insert(name.into(), ids.into_iter().map(Into::into).collect());
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Related ids for a relation, if the relation is present
    pub fn related_ids(&self, name: &str) -> Option<&[String]> {
        self.relations.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let record = EntityRecord::new("1")
            .with_field("name", "Alice")
            .with_field("age", 30)
            .with_relation("tags", ["3", "1"]);

        assert_eq!(record.id, "1");
        assert_eq!(record.get("name"), Some(&json!("Alice")));
        assert_eq!(record.get("age"), Some(&json!(30)));
        assert_eq!(record.related_ids("tags").unwrap(), ["3", "1"]);
        assert!(record.related_ids("groups").is_none());
    }

    #[test]
    fn test_set_keeps_field_order() {
        let mut record = EntityRecord::new("1")
            .with_field("name", "Alice")
            .with_field("email", "a@example.com");
        record.set("name", "Bob");

        let keys: Vec<_> = record.fields.keys().cloned().collect();
        assert_eq!(keys, ["name", "email"]);
    }

    #[test]
    fn test_unset() {
        let mut record = EntityRecord::new("1").with_field("name", "Alice");
        assert_eq!(record.unset("name"), Some(json!("Alice")));
        assert!(record.unset("name").is_none());
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_relations_omitted_when_empty() {
        let record = EntityRecord::new("9").with_field("name", "x");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("relations").is_none());
    }
}
