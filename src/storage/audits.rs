//! Audit repository for JSON storage
//!
//! Append-only store for audit headers and deltas, persisted to audits.json.
//! Ids are sequence numbers assigned on insert.

use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;

use crate::error::AuditError;
use crate::models::{AuditDelta, AuditHeader, DeltaId, HeaderId, NewAuditDelta, NewAuditHeader};

use super::file_io::{read_json, write_json_atomic};
use super::AuditFilter;

/// Serializable audit data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AuditData {
    #[serde(default)]
    headers: Vec<AuditHeader>,
    #[serde(default)]
    deltas: Vec<AuditDelta>,
}

impl AuditData {
    fn next_header_id(&self) -> HeaderId {
        self.headers
            .iter()
            .map(|h| h.id)
            .max()
            .map_or(HeaderId::new(1), |id| id.next())
    }

    fn next_delta_id(&self) -> DeltaId {
        self.deltas
            .iter()
            .map(|d| d.id)
            .max()
            .map_or(DeltaId::new(1), |id| id.next())
    }
}

/// Repository for audit header and delta persistence
pub struct AuditRepository {
    path: PathBuf,
    data: RwLock<AuditData>,
}

impl AuditRepository {
    /// Create a new audit repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(AuditData::default()),
        }
    }

    /// Load the audit trail from disk
    pub fn load(&self) -> Result<(), AuditError> {
        let file_data: AuditData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = file_data;

        Ok(())
    }

    /// Save the audit trail to disk
    pub fn save(&self) -> Result<(), AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        write_json_atomic(&self.path, &*data)
    }

    /// Append a header, returning its generated id
    pub fn insert_header(&self, header: NewAuditHeader) -> Result<HeaderId, AuditError> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let id = data.next_header_id();
        data.headers.push(AuditHeader::from_new(id, header, Utc::now()));
        Ok(id)
    }

    /// Append a delta; its parent header must already exist
    pub fn insert_delta(&self, delta: NewAuditDelta) -> Result<DeltaId, AuditError> {
        let mut data = self.data.write().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if !data.headers.iter().any(|h| h.id == delta.audit_id) {
            return Err(AuditError::Storage(format!(
                "Cannot insert delta for missing header {}",
                delta.audit_id
            )));
        }

        let id = data.next_delta_id();
        data.deltas.push(AuditDelta::from_new(id, delta));
        Ok(id)
    }

    /// Get a header by id
    pub fn get_header(&self, id: HeaderId) -> Result<Option<AuditHeader>, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.headers.iter().find(|h| h.id == id).cloned())
    }

    /// Headers matching the filter, oldest first
    ///
    /// With a limit, the most recent `limit` matches are returned.
    pub fn headers(&self, filter: &AuditFilter) -> Result<Vec<AuditHeader>, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let matching: Vec<_> = data
            .headers
            .iter()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect();

        Ok(match filter.limit {
            Some(limit) if matching.len() > limit => matching[matching.len() - limit..].to_vec(),
            _ => matching,
        })
    }

    /// Deltas belonging to a header, in insertion order
    pub fn deltas_for(&self, audit_id: HeaderId) -> Result<Vec<AuditDelta>, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data
            .deltas
            .iter()
            .filter(|d| d.audit_id == audit_id)
            .cloned()
            .collect())
    }

    /// Number of headers
    pub fn header_count(&self) -> Result<usize, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.headers.len())
    }

    /// Number of deltas
    pub fn delta_count(&self) -> Result<usize, AuditError> {
        let data = self.data.read().map_err(|e| {
            AuditError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.deltas.len())
    }
}
