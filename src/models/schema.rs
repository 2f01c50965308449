//! Entity schema
//!
//! Describes what the audit engine needs to know about the host's entity
//! types: which many-to-many relations exist, which fields are computed, and
//! whether the type is itself audited.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Entity types that hold the audit trail itself and are never audited
pub const AUDIT_MODELS: [&str; 2] = ["Audit", "AuditDelta"];

/// Whether the entity type is one of the audit storage types
pub fn is_audit_model(entity_type: &str) -> bool {
    AUDIT_MODELS.contains(&entity_type)
}

/// Schema facts about one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Many-to-many relation name -> target entity type
    #[serde(default)]
    pub many_to_many: BTreeMap<String, String>,

    /// Computed fields that never produce deltas
    #[serde(default)]
    pub virtual_fields: BTreeSet<String>,

    /// Whether changes to this type are audited
    #[serde(default = "default_audited")]
    pub audited: bool,
}

fn default_audited() -> bool {
    true
}

impl Default for EntityDefinition {
    fn default() -> Self {
        Self {
            many_to_many: BTreeMap::new(),
            virtual_fields: BTreeSet::new(),
            audited: default_audited(),
        }
    }
}

/// Schema of every entity type known to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    entities: BTreeMap<String, EntityDefinition>,
    /// Whether types missing from the schema are audited
    audit_undeclared: bool,
}

impl Default for EntitySchema {
    fn default() -> Self {
        Self {
            entities: BTreeMap::new(),
            audit_undeclared: true,
        }
    }
}

impl EntitySchema {
    pub fn new(audit_undeclared: bool) -> Self {
        Self {
            entities: BTreeMap::new(),
            audit_undeclared,
        }
    }

    /// Register (or replace) an entity type definition
    pub fn define(&mut self, entity_type: impl Into<String>, definition: EntityDefinition) {
        self.entities.insert(entity_type.into(), definition);
    }

    /// Builder-style variant of [`EntitySchema::define`]
    pub fn with_entity(mut self, entity_type: impl Into<String>, definition: EntityDefinition) -> Self {
        self.define(entity_type, definition);
        self
    }

    pub fn get(&self, entity_type: &str) -> Option<&EntityDefinition> {
        self.entities.get(entity_type)
    }

    /// Target type of a many-to-many relation, if `relation` is one
    pub fn many_to_many_target(&self, entity_type: &str, relation: &str) -> Option<&str> {
        self.entities
            .get(entity_type)
            .and_then(|def| def.many_to_many.get(relation))
            .map(String::as_str)
    }

    /// Whether changes to the entity type are audited
    pub fn is_audited(&self, entity_type: &str) -> bool {
        if is_audit_model(entity_type) {
            return false;
        }
        self.entities
            .get(entity_type)
            .map_or(self.audit_undeclared, |def| def.audited)
    }

    /// Whether `field` is a computed field of the entity type
    pub fn is_virtual_field(&self, entity_type: &str, field: &str) -> bool {
        self.entities
            .get(entity_type)
            .is_some_and(|def| def.virtual_fields.contains(field))
    }
}
