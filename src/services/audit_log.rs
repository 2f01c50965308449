//! Audit log service
//!
//! Reads the audit trail back: headers matching a filter, each with its
//! deltas, plus the snapshot stored on a header.

use crate::error::{AuditError, AuditResult};
use crate::models::{AuditLogEntry, HeaderId, Snapshot};
use crate::storage::{AuditFilter, AuditStore};

/// Service for reading the audit trail
pub struct AuditLogService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> AuditLogService<'a, S>
where
    S: AuditStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Headers matching the filter, oldest first, each with its deltas
    pub fn entries(&self, filter: &AuditFilter) -> AuditResult<Vec<AuditLogEntry>> {
        self.store
            .headers(filter)?
            .into_iter()
            .map(|header| {
                let deltas = self.store.deltas_for(header.id)?;
                Ok(AuditLogEntry { header, deltas })
            })
            .collect()
    }

    /// Full history of one entity
    pub fn history(&self, model: &str, entity_id: &str) -> AuditResult<Vec<AuditLogEntry>> {
        self.entries(&AuditFilter::default().model(model).entity_id(entity_id))
    }

    /// The snapshot recorded on a header
    pub fn snapshot(&self, header_id: HeaderId) -> AuditResult<Snapshot> {
        let header = self
            .store
            .headers(&AuditFilter::default())?
            .into_iter()
            .find(|h| h.id == header_id)
            .ok_or_else(|| AuditError::header_not_found(header_id.to_string()))?;

        match Snapshot::from_json_object(&header.json_object)? {
            Some((_, snapshot)) => Ok(snapshot),
            None => Err(AuditError::Json(format!(
                "Malformed snapshot on {}",
                header_id
            ))),
        }
    }
}
