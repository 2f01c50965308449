//! Audit recording
//!
//! Writes one audit header and one delta per changed field. The header is
//! inserted first so every delta can reference its generated id.

use crate::error::AuditResult;
use crate::models::{
    AuditEvent, CorrelationId, FieldChange, HeaderId, NewAuditDelta, NewAuditHeader, Snapshot,
    Source,
};
use crate::storage::AuditStore;

/// Everything describing the header of one recorded operation
#[derive(Debug, Clone)]
pub struct RecordRequest<'a> {
    pub event: AuditEvent,
    pub model: &'a str,
    pub entity_id: &'a str,
    pub snapshot: &'a Snapshot,
    pub source: Option<Source>,
    pub correlation_id: CorrelationId,
}

/// Whether an operation warrants a header at all
///
/// A create is always recorded, even with nothing to report; anything else
/// only when at least one field changed.
pub fn should_record(event: AuditEvent, changes: &[FieldChange]) -> bool {
    event == AuditEvent::Create || !changes.is_empty()
}

/// Persist one header plus a delta per change, returning the header id
///
/// Insert failures propagate as-is. Rows already written stay written.
pub fn record<S>(store: &S, request: RecordRequest<'_>, changes: &[FieldChange]) -> AuditResult<HeaderId>
where
    S: AuditStore + ?Sized,
{
    let source = request.source.unwrap_or_default();
    let header = NewAuditHeader {
        event: request.event,
        model: request.model.to_string(),
        entity_id: request.entity_id.to_string(),
        request_id: request.correlation_id,
        json_object: request.snapshot.to_json_object(request.model)?,
        source_id: source.id,
        description: source.description,
    };

    let header_id = store.insert_header(header)?;

    for change in changes {
        store.insert_delta(NewAuditDelta::from_change(header_id, change))?;
    }

    tracing::info!(
        event = %request.event,
        model = request.model,
        entity_id = request.entity_id,
        request_id = %request.correlation_id,
        %header_id,
        deltas = changes.len(),
        "audit recorded"
    );

    Ok(header_id)
}
