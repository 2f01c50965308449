//! Audit record data structures
//!
//! Defines the audit header (one per recorded operation) and the audit delta
//! (one per changed field), along with the event kinds and acting source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CorrelationId, DeltaId, HeaderId};

/// Kind of lifecycle event an audit header records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditEvent {
    /// Entity was created
    Create,
    /// Entity was edited
    Edit,
    /// Entity was deleted
    Delete,
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditEvent::Create => write!(f, "CREATE"),
            AuditEvent::Edit => write!(f, "EDIT"),
            AuditEvent::Delete => write!(f, "DELETE"),
        }
    }
}

impl std::str::FromStr for AuditEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(AuditEvent::Create),
            "EDIT" => Ok(AuditEvent::Edit),
            "DELETE" => Ok(AuditEvent::Delete),
            other => Err(format!("Unknown audit event: {other}")),
        }
    }
}

/// The acting user or process behind an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Source {
    pub fn new(id: Option<String>, description: Option<String>) -> Self {
        Self { id, description }
    }

    /// Whether neither an id nor a description is known
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.description.is_none()
    }
}

/// One changed field between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

impl FieldChange {
    pub fn new(
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// Audit header as handed to the store for insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditHeader {
    pub event: AuditEvent,
    pub model: String,
    pub entity_id: String,
    pub request_id: CorrelationId,
    pub json_object: String,
    pub source_id: Option<String>,
    pub description: Option<String>,
}

/// A persisted audit header
///
/// Written once per recorded operation and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditHeader {
    /// Generated on insert
    pub id: HeaderId,

    /// CREATE, EDIT or DELETE
    pub event: AuditEvent,

    /// Entity type name
    pub model: String,

    /// Primary key of the audited entity
    pub entity_id: String,

    /// Correlation id shared by every record of the same request
    pub request_id: CorrelationId,

    /// Full snapshot serialized as `{"<model>": {...}}`
    pub json_object: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the header was written (UTC)
    pub created: DateTime<Utc>,
}

impl AuditHeader {
    /// Materialize a header from its insert payload
    pub fn from_new(id: HeaderId, header: NewAuditHeader, created: DateTime<Utc>) -> Self {
        Self {
            id,
            event: header.event,
            model: header.model,
            entity_id: header.entity_id,
            request_id: header.request_id,
            json_object: header.json_object,
            source_id: header.source_id,
            description: header.description,
            created,
        }
    }
}

/// Audit delta as handed to the store for insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditDelta {
    pub audit_id: HeaderId,
    pub property_name: String,
    pub old_value: String,
    pub new_value: String,
}

impl NewAuditDelta {
    pub fn from_change(audit_id: HeaderId, change: &FieldChange) -> Self {
        Self {
            audit_id,
            property_name: change.field.clone(),
            old_value: change.old_value.clone(),
            new_value: change.new_value.clone(),
        }
    }
}

/// A persisted audit delta, belonging to exactly one header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDelta {
    pub id: DeltaId,
    pub audit_id: HeaderId,
    pub property_name: String,
    pub old_value: String,
    pub new_value: String,
}

impl AuditDelta {
    pub fn from_new(id: DeltaId, delta: NewAuditDelta) -> Self {
        Self {
            id,
            audit_id: delta.audit_id,
            property_name: delta.property_name,
            old_value: delta.old_value,
            new_value: delta.new_value,
        }
    }
}

/// A header together with its deltas, as read back for display and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(flatten)]
    pub header: AuditHeader,
    #[serde(default)]
    pub deltas: Vec<AuditDelta>,
}
