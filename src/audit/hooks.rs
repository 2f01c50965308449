//! Optional host hooks
//!
//! Hosts implement [`AuditHooks`] to report computed fields and to react to
//! recorded audits. Every method has a no-op default.

use std::collections::BTreeSet;

use crate::models::{FieldChange, HeaderId, Snapshot};

/// Capabilities a host entity type may expose to the audit engine
pub trait AuditHooks {
    /// Whether `field` is computed rather than stored
    fn is_virtual_field(&self, _field: &str) -> bool {
        false
    }

    /// Called after a CREATE header has been written
    fn after_audit_create(&self, _header_id: HeaderId) {}

    /// Called after an EDIT header and its deltas have been written
    fn after_audit_update(
        &self,
        _original: Option<&Snapshot>,
        _changes: &[FieldChange],
        _header_id: HeaderId,
    ) {
    }

    /// Called once per changed field on edit
    fn after_audit_property(&self, _field: &str, _old_value: &str, _new_value: &str) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl AuditHooks for NoHooks {}

/// Hooks driven by configuration: a fixed virtual field set, with recorded
/// audits traced at debug level
#[derive(Debug, Clone, Default)]
pub struct ConfiguredHooks {
    entity_type: String,
    virtual_fields: BTreeSet<String>,
}

impl ConfiguredHooks {
    pub fn new(entity_type: impl Into<String>, virtual_fields: BTreeSet<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            virtual_fields,
        }
    }
}

impl AuditHooks for ConfiguredHooks {
    fn is_virtual_field(&self, field: &str) -> bool {
        self.virtual_fields.contains(field)
    }

    fn after_audit_create(&self, header_id: HeaderId) {
        tracing::debug!(entity_type = %self.entity_type, %header_id, "audit create recorded");
    }

    fn after_audit_update(
        &self,
        _original: Option<&Snapshot>,
        changes: &[FieldChange],
        header_id: HeaderId,
    ) {
        tracing::debug!(
            entity_type = %self.entity_type,
            %header_id,
            changes = changes.len(),
            "audit update recorded"
        );
    }

    fn after_audit_property(&self, field: &str, old_value: &str, new_value: &str) {
        tracing::trace!(
            entity_type = %self.entity_type,
            field,
            old_value,
            new_value,
            "property changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_hooks_defaults() {
        let hooks = NoHooks;
        assert!(!hooks.is_virtual_field("anything"));
        hooks.after_audit_create(HeaderId::new(1));
        hooks.after_audit_property("name", "a", "b");
    }

    #[test]
    fn test_configured_virtual_fields() {
        let hooks = ConfiguredHooks::new("Person", ["full_name".to_string()].into_iter().collect());
        assert!(hooks.is_virtual_field("full_name"));
        assert!(!hooks.is_virtual_field("name"));
    }
}
