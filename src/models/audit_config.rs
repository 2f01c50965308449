//! Per-entity-type audit configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::schema::EntitySchema;

/// Fields ignored unless a configuration says otherwise
pub const DEFAULT_IGNORED_FIELDS: [&str; 4] = ["created", "modified", "created_at", "updated_at"];

/// How edit-mode diffing decides two values differ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Values differ when their stored text differs
    #[default]
    Strict,
    /// Coercive comparison: numerically equal text and the empty values
    /// `""`, `"0"`, `null` and `false` compare equal
    Loose,
}

/// Audit configuration for one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Fields that never produce deltas
    pub ignore: BTreeSet<String>,
    /// Many-to-many relations captured as sorted id lists
    pub habtm: Vec<String>,
    /// Edit-mode value comparison
    pub comparison: Comparison,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            ignore: DEFAULT_IGNORED_FIELDS.iter().map(|f| f.to_string()).collect(),
            habtm: Vec::new(),
            comparison: Comparison::default(),
        }
    }
}

impl AuditConfig {
    /// Builder: replace the ignore set
    pub fn with_ignore<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: add fields to the ignore set
    pub fn ignoring<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Builder: set the tracked many-to-many relations
    pub fn with_habtm<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.habtm = relations.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the comparison mode
    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn is_ignored(&self, field: &str) -> bool {
        self.ignore.contains(field)
    }

    /// Drop tracked relations that are not many-to-many relations of
    /// `entity_type`, or whose target type is itself audited
    pub fn resolve(mut self, entity_type: &str, schema: &EntitySchema) -> Self {
        self.habtm.retain(|relation| match schema.many_to_many_target(entity_type, relation) {
            None => {
                tracing::warn!(
                    entity_type,
                    relation = relation.as_str(),
                    "dropping tracked relation: not a many-to-many relation"
                );
                false
            }
            Some(target) if schema.is_audited(target) => {
                tracing::warn!(
                    entity_type,
                    relation = relation.as_str(),
                    target,
                    "dropping tracked relation: target type is audited"
                );
                false
            }
            Some(_) => true,
        });
        self
    }
}
