//! Auditable lifecycle controller
//!
//! Wraps an entity type's save and delete lifecycle:
//!
//! - `before_save` captures the current snapshot of an existing entity
//! - `after_save` re-reads, diffs and records CREATE or EDIT
//! - `before_delete` captures the snapshot that must exist
//! - `after_delete` records DELETE from that snapshot
//!
//! Captured snapshots are kept per entity id until the matching `after_*`
//! call consumes them.

use std::collections::HashMap;

use crate::error::{AuditError, AuditResult};
use crate::models::{is_audit_model, AuditConfig, AuditEvent, EntitySchema, HeaderId, Snapshot};
use crate::storage::{AuditBackend, AuditStore};

use super::context::RequestContext;
use super::diff::{compute_deltas, DiffMode};
use super::hooks::{AuditHooks, NoHooks};
use super::recorder::{record, should_record, RecordRequest};
use super::snapshot::{read_for_delete, read_snapshot};

/// Drives auditing for one entity type
pub struct AuditableController {
    entity_type: String,
    config: AuditConfig,
    hooks: Box<dyn AuditHooks>,
    pending: HashMap<String, Snapshot>,
}

impl AuditableController {
    /// Create a controller, dropping tracked relations the schema rejects
    pub fn new(entity_type: impl Into<String>, config: AuditConfig, schema: &EntitySchema) -> Self {
        let entity_type = entity_type.into();
        let config = config.resolve(&entity_type, schema);
        Self {
            entity_type,
            config,
            hooks: Box::new(NoHooks),
            pending: HashMap::new(),
        }
    }

    /// Attach host hooks
    pub fn with_hooks(mut self, hooks: impl AuditHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Audit storage types are never audited
    fn bypassed(&self) -> bool {
        is_audit_model(&self.entity_type)
    }

    /// Whether a snapshot is being held for the entity
    pub fn has_pending(&self, entity_id: &str) -> bool {
        self.pending.contains_key(entity_id)
    }

    /// PRE_SAVE: capture the current state of an existing entity
    ///
    /// New entities (no id yet, or an id the store does not know) hold
    /// nothing and are diffed in create mode.
    pub fn before_save<S>(&mut self, store: &S, entity_id: Option<&str>) -> AuditResult<()>
    where
        S: AuditBackend + ?Sized,
    {
        if self.bypassed() {
            return Ok(());
        }
        let Some(entity_id) = entity_id else {
            return Ok(());
        };

        match read_snapshot(store, &self.entity_type, entity_id, &self.config)? {
            Some(original) => {
                self.pending.insert(entity_id.to_string(), original);
            }
            None => {
                self.pending.remove(entity_id);
            }
        }
        Ok(())
    }

    /// SAVED: diff the committed state against the captured one and record it
    ///
    /// Returns the header id when something was recorded. An entity that
    /// vanished during the save is recorded as deleted.
    pub fn after_save<S>(
        &mut self,
        ctx: &RequestContext,
        store: &S,
        entity_id: &str,
        created: bool,
    ) -> AuditResult<Option<HeaderId>>
    where
        S: AuditBackend + ?Sized,
    {
        if self.bypassed() {
            return Ok(None);
        }

        let original = self.pending.remove(entity_id);

        let Some(current) = read_snapshot(store, &self.entity_type, entity_id, &self.config)? else {
            return match original {
                Some(original) => {
                    tracing::debug!(
                        entity_type = %self.entity_type,
                        entity_id,
                        "entity gone after save, recording delete"
                    );
                    self.record_delete(ctx, store, entity_id, &original).map(Some)
                }
                None => Ok(None),
            };
        };

        let (event, mode) = if created {
            (AuditEvent::Create, DiffMode::Create)
        } else {
            (AuditEvent::Edit, DiffMode::Edit)
        };

        let changes = compute_deltas(
            original.as_ref(),
            &current,
            &self.config,
            self.hooks.as_ref(),
            mode,
        );

        if !should_record(event, &changes) {
            tracing::debug!(entity_type = %self.entity_type, entity_id, "no changes to audit");
            return Ok(None);
        }

        let header_id = record(
            store,
            RecordRequest {
                event,
                model: &self.entity_type,
                entity_id,
                snapshot: &current,
                source: ctx.current_source(),
                correlation_id: ctx.correlation_id(),
            },
            &changes,
        )?;

        if created {
            self.hooks.after_audit_create(header_id);
        } else {
            for change in &changes {
                self.hooks
                    .after_audit_property(&change.field, &change.old_value, &change.new_value);
            }
            self.hooks
                .after_audit_update(original.as_ref(), &changes, header_id);
        }

        Ok(Some(header_id))
    }

    /// PRE_DELETE: capture the entity about to be deleted
    ///
    /// # Errors
    ///
    /// Returns `AuditError::NotFound` when the entity does not exist.
    pub fn before_delete<S>(&mut self, store: &S, entity_id: &str) -> AuditResult<()>
    where
        S: AuditBackend + ?Sized,
    {
        if self.bypassed() {
            return Ok(());
        }

        let original = read_for_delete(store, &self.entity_type, entity_id)?
            .ok_or_else(|| AuditError::entity_not_found(self.entity_type.clone(), entity_id))?;
        self.pending.insert(entity_id.to_string(), original);
        Ok(())
    }

    /// DELETED: record a DELETE header from the captured snapshot
    ///
    /// Without a prior `before_delete` there is nothing to record.
    pub fn after_delete<S>(
        &mut self,
        ctx: &RequestContext,
        store: &S,
        entity_id: &str,
    ) -> AuditResult<Option<HeaderId>>
    where
        S: AuditBackend + ?Sized,
    {
        if self.bypassed() {
            return Ok(None);
        }

        match self.pending.remove(entity_id) {
            Some(original) => self.record_delete(ctx, store, entity_id, &original).map(Some),
            None => Ok(None),
        }
    }

    fn record_delete<S>(
        &self,
        ctx: &RequestContext,
        store: &S,
        entity_id: &str,
        original: &Snapshot,
    ) -> AuditResult<HeaderId>
    where
        S: AuditStore + ?Sized,
    {
        record(
            store,
            RecordRequest {
                event: AuditEvent::Delete,
                model: &self.entity_type,
                entity_id,
                snapshot: original,
                source: ctx.current_source(),
                correlation_id: ctx.correlation_id(),
            },
            &[],
        )
    }
}
