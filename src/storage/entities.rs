//! Entity repository for JSON storage
//!
//! Holds the host's business objects in entities.json, keyed by entity type
//! and primary key.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::AuditError;
use crate::models::EntityRecord;

use super::file_io::{read_json, write_json_atomic};
use super::FetchQuery;

/// Serializable entity data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct EntityData {
    /// entity type -> records
    entities: BTreeMap<String, Vec<EntityRecord>>,
}

/// Repository for entity persistence
pub struct EntityRepository {
    path: PathBuf,
    data: RwLock<BTreeMap<String, BTreeMap<String, EntityRecord>>>,
}

impl EntityRepository {
    /// Create a new entity repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load entities from disk
    pub fn load(&self) -> Result<(), AuditError> {
        let file_data: EntityData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for (entity_type, records) in file_data.entities {
            let by_id = records.into_iter().map(|r| (r.id.clone(), r)).collect();
            data.insert(entity_type, by_id);
        }

        Ok(())
    }

    /// Save entities to disk
    pub fn save(&self) -> Result<(), AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let entities = data
            .iter()
            .map(|(entity_type, records)| (entity_type.clone(), records.values().cloned().collect()))
            .collect();

        write_json_atomic(&self.path, &EntityData { entities })
    }

    /// Fetch one record by primary key, carrying only the requested relations
    ///
    /// Reads go straight to the authoritative in-memory map, so every read
    /// observes the latest write.
    pub fn fetch(
        &self,
        entity_type: &str,
        id: &str,
        query: &FetchQuery,
    ) -> Result<Option<EntityRecord>, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let Some(stored) = data.get(entity_type).and_then(|records| records.get(id)) else {
            return Ok(None);
        };

        let mut record = EntityRecord::new(stored.id.clone());
        record.fields = stored.fields.clone();
        for relation in &query.relations {
            let ids = stored.relations.get(relation).cloned().unwrap_or_default();
            record.relations.insert(relation.clone(), ids);
        }

        Ok(Some(record))
    }

    /// Get a stored record with every relation it carries
    pub fn get(&self, entity_type: &str, id: &str) -> Result<Option<EntityRecord>, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .get(entity_type)
            .and_then(|records| records.get(id))
            .cloned())
    }

    /// Insert or update a record, returning true when it was inserted
    pub fn upsert(&self, entity_type: &str, record: EntityRecord) -> Result<bool, AuditError> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let records = data.entry(entity_type.to_string()).or_default();
        Ok(records.insert(record.id.clone(), record).is_none())
    }

    /// Delete a record, returning true when it existed
    pub fn delete(&self, entity_type: &str, id: &str) -> Result<bool, AuditError> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(data
            .get_mut(entity_type)
            .is_some_and(|records| records.remove(id).is_some()))
    }

    /// Next free numeric primary key for an entity type
    pub fn next_id(&self, entity_type: &str) -> Result<String, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let max = data
            .get(entity_type)
            .map(|records| {
                records
                    .keys()
                    .filter_map(|id| id.parse::<u64>().ok())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);

        Ok((max + 1).to_string())
    }

    /// All records of a type, ordered by primary key
    pub fn get_all(&self, entity_type: &str) -> Result<Vec<EntityRecord>, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data
            .get(entity_type)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    /// Count records of a type
    pub fn count(&self, entity_type: &str) -> Result<usize, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.get(entity_type).map_or(0, BTreeMap::len))
    }
}
