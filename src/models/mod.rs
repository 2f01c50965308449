//! Core data models for audit-trail
//!
//! Entity records and snapshots on the audited side; audit headers, deltas
//! and their ids on the audit side; plus the per-type configuration and
//! schema that steer snapshotting.

pub mod audit;
pub mod audit_config;
pub mod entity;
pub mod ids;
pub mod schema;
pub mod snapshot;

pub use audit::{
    AuditDelta, AuditEvent, AuditHeader, AuditLogEntry, FieldChange, NewAuditDelta,
    NewAuditHeader, Source,
};
pub use audit_config::{AuditConfig, Comparison, DEFAULT_IGNORED_FIELDS};
pub use entity::EntityRecord;
pub use ids::{CorrelationId, DeltaId, HeaderId};
pub use schema::{is_audit_model, EntityDefinition, EntitySchema, AUDIT_MODELS};
pub use snapshot::{value_to_string, Snapshot};
