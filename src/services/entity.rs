//! Entity service
//!
//! Provides audited create, update and delete of entity records, using the
//! per-type audit settings for the current request.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::audit::{AuditedStore, RequestContext};
use crate::config::Settings;
use crate::error::{AuditError, AuditResult};
use crate::models::{EntityRecord, HeaderId};
use crate::storage::Storage;

/// Result of an audited write
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChange {
    /// The record as written (or as it was, for deletes)
    pub record: EntityRecord,
    /// The audit header, when one was recorded
    pub header_id: Option<HeaderId>,
}

/// Field and relation edits applied by [`EntityService::update`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub set: Map<String, Value>,
    pub unset: Vec<String>,
    pub link: BTreeMap<String, Vec<String>>,
}

impl EntityPatch {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty() && self.link.is_empty()
    }
}

/// Service for audited entity management
pub struct EntityService<'a> {
    storage: &'a Storage,
    settings: &'a Settings,
    ctx: &'a RequestContext,
}

impl<'a> EntityService<'a> {
    /// Create a new entity service bound to one request
    pub fn new(storage: &'a Storage, settings: &'a Settings, ctx: &'a RequestContext) -> Self {
        Self {
            storage,
            settings,
            ctx,
        }
    }

    fn audited(&self, entity_type: &str) -> AuditedStore<'a, Storage> {
        let mut audited = AuditedStore::new(self.storage, self.settings.schema());
        audited.configure(entity_type, self.settings.audit_config(entity_type));
        audited
    }

    /// Create a new entity
    ///
    /// Without an explicit id the next free numeric id is assigned.
    pub fn create(
        &self,
        entity_type: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
        links: BTreeMap<String, Vec<String>>,
    ) -> AuditResult<EntityChange> {
        let entity_type = validate_type(entity_type)?;
        let id = match id.map(str::trim) {
            Some("") => {
                return Err(AuditError::Validation("Entity id cannot be empty".into()));
            }
            Some(id) => id.to_string(),
            None => self.storage.entities.next_id(entity_type)?,
        };
        validate_links(&links)?;

        let record = EntityRecord {
            id,
            fields,
            relations: links,
        };

        let header_id = self
            .audited(entity_type)
            .create(self.ctx, entity_type, record.clone())?;
        self.storage.save_all()?;

        Ok(EntityChange { record, header_id })
    }

    /// Apply a patch to an existing entity
    pub fn update(&self, entity_type: &str, id: &str, patch: EntityPatch) -> AuditResult<EntityChange> {
        let entity_type = validate_type(entity_type)?;
        validate_links(&patch.link)?;

        let mut record = self
            .storage
            .entities
            .get(entity_type, id)?
            .ok_or_else(|| AuditError::entity_not_found(entity_type, id))?;

        for field in &patch.unset {
            record.unset(field);
        }
        for (field, value) in patch.set {
            record.set(field, value);
        }
        for (relation, ids) in patch.link {
            record.link(relation, ids);
        }

        let header_id = self
            .audited(entity_type)
            .update(self.ctx, entity_type, record.clone())?;
        self.storage.save_all()?;

        Ok(EntityChange { record, header_id })
    }

    /// Delete an entity
    pub fn delete(&self, entity_type: &str, id: &str) -> AuditResult<EntityChange> {
        let entity_type = validate_type(entity_type)?;

        let record = self
            .storage
            .entities
            .get(entity_type, id)?
            .ok_or_else(|| AuditError::entity_not_found(entity_type, id))?;

        let header_id = self.audited(entity_type).delete(self.ctx, entity_type, id)?;
        self.storage.save_all()?;

        Ok(EntityChange { record, header_id })
    }

    /// Get an entity by id
    pub fn get(&self, entity_type: &str, id: &str) -> AuditResult<Option<EntityRecord>> {
        self.storage.entities.get(entity_type, id)
    }

    /// List all entities of a type
    pub fn list(&self, entity_type: &str) -> AuditResult<Vec<EntityRecord>> {
        self.storage.entities.get_all(entity_type)
    }
}

fn validate_type(entity_type: &str) -> AuditResult<&str> {
    let entity_type = entity_type.trim();
    if entity_type.is_empty() {
        return Err(AuditError::Validation("Entity type cannot be empty".into()));
    }
    Ok(entity_type)
}

fn validate_links(links: &BTreeMap<String, Vec<String>>) -> AuditResult<()> {
    if links.keys().any(|relation| relation.trim().is_empty()) {
        return Err(AuditError::Validation("Relation name cannot be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuditPaths, EntitySettings};
    use crate::models::AuditEvent;
    use crate::storage::{AuditFilter, AuditStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn test_settings() -> Settings {
        let mut person = EntitySettings::new("Person");
        person.many_to_many.insert("tags".into(), "Tag".into());
        person.habtm.push("tags".into());
        person.ignore.push("age".into());

        let mut tag = EntitySettings::new("Tag");
        tag.audited = false;

        Settings {
            entities: vec![person, tag],
            ..Settings::default()
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn set(value: Value) -> EntityPatch {
        EntityPatch {
            set: fields(value),
            ..EntityPatch::default()
        }
    }

    #[test]
    fn test_create_with_ignored_field() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        let change = service
            .create("Person", None, fields(json!({"name": "Alice", "age": 0})), BTreeMap::new())
            .unwrap();
        assert_eq!(change.record.id, "1");

        let headers = storage.headers(&AuditFilter::default()).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].event, AuditEvent::Create);

        let deltas = storage.deltas_for(change.header_id.unwrap()).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].property_name, "name");
        assert_eq!(deltas[0].old_value, "");
        assert_eq!(deltas[0].new_value, "Alice");
    }

    #[test]
    fn test_edit_records_one_delta() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        service
            .create("Person", Some("1"), fields(json!({"name": "Alice"})), BTreeMap::new())
            .unwrap();
        let change = service.update("Person", "1", set(json!({"name": "Bob"}))).unwrap();

        let header = storage.audits.get_header(change.header_id.unwrap()).unwrap().unwrap();
        assert_eq!(header.event, AuditEvent::Edit);
        let deltas = storage.deltas_for(header.id).unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!((deltas[0].old_value.as_str(), deltas[0].new_value.as_str()), ("Alice", "Bob"));
    }

    #[test]
    fn test_edit_without_changes_records_nothing() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        service
            .create("Person", Some("1"), fields(json!({"name": "Alice"})), BTreeMap::new())
            .unwrap();
        let change = service
            .update("Person", "1", set(json!({"name": "Alice", "age": 41})))
            .unwrap();

        assert!(change.header_id.is_none());
        assert_eq!(storage.audits.header_count().unwrap(), 1);
        assert_eq!(storage.audits.delta_count().unwrap(), 1);
    }

    #[test]
    fn test_update_keeps_unpatched_relations() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        let mut links = BTreeMap::new();
        links.insert("tags".to_string(), vec!["3".to_string(), "1".to_string(), "2".to_string()]);
        let created = service
            .create("Person", Some("1"), fields(json!({"name": "Alice"})), links)
            .unwrap();

        let deltas = storage.deltas_for(created.header_id.unwrap()).unwrap();
        assert_eq!(deltas[1].property_name, "tags");
        assert_eq!(deltas[1].new_value, "1,2,3");

        let updated = service.update("Person", "1", set(json!({"name": "Bob"}))).unwrap();
        assert_eq!(updated.record.related_ids("tags").unwrap(), ["3", "1", "2"]);
        assert_eq!(storage.deltas_for(updated.header_id.unwrap()).unwrap().len(), 1);
    }

    #[test]
    fn test_unset_removes_field_without_delta() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        service
            .create(
                "Person",
                Some("1"),
                fields(json!({"name": "Alice", "email": "a@example.com"})),
                BTreeMap::new(),
            )
            .unwrap();
        let patch = EntityPatch {
            unset: vec!["email".into()],
            ..EntityPatch::default()
        };
        let change = service.update("Person", "1", patch).unwrap();

        assert!(change.record.get("email").is_none());
        assert!(change.header_id.is_none());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        assert!(service.delete("Person", "1").unwrap_err().is_not_found());

        service
            .create("Person", Some("1"), fields(json!({"name": "Alice"})), BTreeMap::new())
            .unwrap();
        let change = service.delete("Person", "1").unwrap();

        let deletes = storage
            .headers(&AuditFilter::default().event(AuditEvent::Delete))
            .unwrap();
        assert_eq!(deletes.len(), 1);
        assert!(storage.deltas_for(change.header_id.unwrap()).unwrap().is_empty());
        assert!(service.get("Person", "1").unwrap().is_none());
    }

    #[test]
    fn test_unaudited_type() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        let change = service
            .create("Tag", None, fields(json!({"label": "red"})), BTreeMap::new())
            .unwrap();
        assert!(change.header_id.is_none());
        assert_eq!(service.list("Tag").unwrap().len(), 1);
    }

    #[test]
    fn test_validation() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        assert!(service
            .create("  ", None, Map::new(), BTreeMap::new())
            .unwrap_err()
            .is_validation());
        assert!(service
            .create("Person", Some(""), Map::new(), BTreeMap::new())
            .unwrap_err()
            .is_validation());
        assert!(service
            .update("Person", "404", EntityPatch::default())
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_request_shares_correlation_id() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = test_settings();
        let ctx = RequestContext::new();
        let service = EntityService::new(&storage, &settings, &ctx);

        service
            .create("Person", None, fields(json!({"name": "A"})), BTreeMap::new())
            .unwrap();
        service
            .create("Person", None, fields(json!({"name": "B"})), BTreeMap::new())
            .unwrap();
        service.update("Person", "1", set(json!({"name": "C"}))).unwrap();

        let headers = storage.headers(&AuditFilter::default()).unwrap();
        assert_eq!(headers.len(), 3);
        assert!(headers.iter().all(|h| h.request_id == ctx.correlation_id()));
    }
}
