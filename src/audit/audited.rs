//! Audited store
//!
//! Couples an [`AuditBackend`] with one [`AuditableController`] per entity
//! type and runs the full lifecycle around the store's own writes.

use std::collections::HashMap;

use crate::error::{AuditError, AuditResult};
use crate::models::{AuditConfig, EntityRecord, EntitySchema, HeaderId};
use crate::storage::{AuditBackend, FetchQuery};

use super::context::RequestContext;
use super::controller::AuditableController;
use super::hooks::ConfiguredHooks;

/// A store whose writes are audited
pub struct AuditedStore<'a, S: ?Sized> {
    store: &'a S,
    schema: EntitySchema,
    default_config: AuditConfig,
    configs: HashMap<String, AuditConfig>,
    controllers: HashMap<String, AuditableController>,
}

impl<'a, S> AuditedStore<'a, S>
where
    S: AuditBackend + ?Sized,
{
    pub fn new(store: &'a S, schema: EntitySchema) -> Self {
        Self {
            store,
            schema,
            default_config: AuditConfig::default(),
            configs: HashMap::new(),
            controllers: HashMap::new(),
        }
    }

    /// Configuration used for types without their own
    pub fn with_default_config(mut self, config: AuditConfig) -> Self {
        self.default_config = config;
        self
    }

    /// Set the configuration of one entity type
    pub fn configure(&mut self, entity_type: impl Into<String>, config: AuditConfig) {
        let entity_type = entity_type.into();
        self.controllers.remove(&entity_type);
        self.configs.insert(entity_type, config);
    }

    /// Install a prebuilt controller, e.g. one carrying host hooks
    pub fn register(&mut self, controller: AuditableController) {
        self.controllers
            .insert(controller.entity_type().to_string(), controller);
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn controller(&mut self, entity_type: &str) -> &mut AuditableController {
        let Self {
            schema,
            default_config,
            configs,
            controllers,
            ..
        } = self;

        controllers
            .entry(entity_type.to_string())
            .or_insert_with(|| {
                let config = configs
                    .get(entity_type)
                    .cloned()
                    .unwrap_or_else(|| default_config.clone());
                let virtual_fields = schema
                    .get(entity_type)
                    .map(|def| def.virtual_fields.clone())
                    .unwrap_or_default();
                AuditableController::new(entity_type, config, schema)
                    .with_hooks(ConfiguredHooks::new(entity_type, virtual_fields))
            })
    }

    /// Insert a new entity
    ///
    /// # Errors
    ///
    /// Returns `AuditError::Validation` when an entity with the same id
    /// already exists.
    pub fn create(
        &mut self,
        ctx: &RequestContext,
        entity_type: &str,
        record: EntityRecord,
    ) -> AuditResult<Option<HeaderId>> {
        if self.exists(entity_type, &record.id)? {
            return Err(AuditError::Validation(format!(
                "{} {} already exists",
                entity_type, record.id
            )));
        }
        self.save(ctx, entity_type, record)
    }

    /// Replace an existing entity
    ///
    /// # Errors
    ///
    /// Returns `AuditError::NotFound` when the entity does not exist.
    pub fn update(
        &mut self,
        ctx: &RequestContext,
        entity_type: &str,
        record: EntityRecord,
    ) -> AuditResult<Option<HeaderId>> {
        if !self.exists(entity_type, &record.id)? {
            return Err(AuditError::entity_not_found(entity_type, record.id));
        }
        self.save(ctx, entity_type, record)
    }

    /// Insert or update an entity, auditing whichever happened
    pub fn save(
        &mut self,
        ctx: &RequestContext,
        entity_type: &str,
        record: EntityRecord,
    ) -> AuditResult<Option<HeaderId>> {
        let store = self.store;
        if !self.schema.is_audited(entity_type) {
            store.save(entity_type, record)?;
            return Ok(None);
        }

        let entity_id = record.id.clone();
        let controller = self.controller(entity_type);
        controller.before_save(store, Some(&entity_id))?;
        let created = store.save(entity_type, record)?;
        controller.after_save(ctx, store, &entity_id, created)
    }

    /// Delete an entity, recording its last state
    ///
    /// # Errors
    ///
    /// Returns `AuditError::NotFound` when the entity does not exist.
    pub fn delete(
        &mut self,
        ctx: &RequestContext,
        entity_type: &str,
        entity_id: &str,
    ) -> AuditResult<Option<HeaderId>> {
        let store = self.store;
        if !self.schema.is_audited(entity_type) {
            if !store.remove(entity_type, entity_id)? {
                return Err(AuditError::entity_not_found(entity_type, entity_id));
            }
            return Ok(None);
        }

        let controller = self.controller(entity_type);
        controller.before_delete(store, entity_id)?;
        store.remove(entity_type, entity_id)?;
        controller.after_delete(ctx, store, entity_id)
    }

    fn exists(&self, entity_type: &str, entity_id: &str) -> AuditResult<bool> {
        Ok(self
            .store
            .fetch_one(entity_type, entity_id, &FetchQuery::default())?
            .is_some())
    }
}
