//! User settings for audit-trail
//!
//! Declares the audited entity types: their many-to-many relations, which of
//! those to snapshot, computed fields, and per-type ignore lists.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::paths::AuditPaths;
use crate::error::AuditError;
use crate::models::{AuditConfig, Comparison, EntityDefinition, EntitySchema, DEFAULT_IGNORED_FIELDS};

/// Audit settings for one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySettings {
    /// Entity type name
    pub name: String,

    /// Whether changes to this type are audited
    #[serde(default = "default_true")]
    pub audited: bool,

    /// Many-to-many relation name -> target entity type
    #[serde(default)]
    pub many_to_many: BTreeMap<String, String>,

    /// Relations captured in snapshots as sorted id lists
    #[serde(default)]
    pub habtm: Vec<String>,

    /// Fields ignored in addition to the global defaults
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Computed fields that never produce deltas
    #[serde(default)]
    pub virtual_fields: BTreeSet<String>,
}

impl EntitySettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            audited: true,
            many_to_many: BTreeMap::new(),
            habtm: Vec::new(),
            ignore: Vec::new(),
            virtual_fields: BTreeSet::new(),
        }
    }
}

/// User settings for audit-trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Edit-mode value comparison
    #[serde(default)]
    pub comparison: Comparison,

    /// Fields ignored for every entity type
    #[serde(default = "default_ignore")]
    pub default_ignore: Vec<String>,

    /// Whether entity types without an entry below are audited
    #[serde(default = "default_true")]
    pub audit_undeclared: bool,

    /// Per-type settings
    #[serde(default)]
    pub entities: Vec<EntitySettings>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORED_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            comparison: Comparison::default(),
            default_ignore: default_ignore(),
            audit_undeclared: true,
            entities: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| AuditError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AuditError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| AuditError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Settings of one entity type, if declared
    pub fn entity(&self, name: &str) -> Option<&EntitySettings> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Build the schema of every declared entity type
    pub fn schema(&self) -> EntitySchema {
        let mut schema = EntitySchema::new(self.audit_undeclared);
        for entity in &self.entities {
            schema.define(
                entity.name.clone(),
                EntityDefinition {
                    many_to_many: entity.many_to_many.clone(),
                    virtual_fields: entity.virtual_fields.clone(),
                    audited: entity.audited,
                },
            );
        }
        schema
    }

    /// Unresolved audit configuration for an entity type
    ///
    /// Tracked relations are checked against the schema when a controller
    /// is built.
    pub fn audit_config(&self, entity_type: &str) -> AuditConfig {
        let config = AuditConfig::default()
            .with_ignore(self.default_ignore.iter().cloned())
            .with_comparison(self.comparison);

        match self.entity(entity_type) {
            Some(entity) => config
                .ignoring(entity.ignore.iter().cloned())
                .with_habtm(entity.habtm.iter().cloned()),
            None => config,
        }
    }
}
