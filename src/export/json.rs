//! JSON Export functionality
//!
//! Exports audit log entries to JSON with schema versioning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::error::{AuditError, AuditResult};
use crate::models::AuditLogEntry;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Audit log export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Exported headers with their deltas
    pub entries: Vec<AuditLogEntry>,

    /// Export metadata
    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub header_count: usize,
    pub delta_count: usize,
    /// Distinct correlation ids among the entries
    pub request_count: usize,
}

impl AuditLogExport {
    pub fn new(entries: Vec<AuditLogEntry>) -> Self {
        let mut requests: Vec<_> = entries.iter().map(|e| e.header.request_id).collect();
        requests.sort_by_key(|r| *r.as_uuid());
        requests.dedup();

        let metadata = ExportMetadata {
            header_count: entries.len(),
            delta_count: entries.iter().map(|e| e.deltas.len()).sum(),
            request_count: requests.len(),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            entries,
            metadata,
        }
    }

    /// Validate an export before it is trusted
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Unsupported schema version: {} (expected {})",
                self.schema_version, EXPORT_SCHEMA_VERSION
            ));
        }

        for entry in &self.entries {
            if let Some(orphan) = entry.deltas.iter().find(|d| d.audit_id != entry.header.id) {
                return Err(format!(
                    "Delta {} does not belong to {}",
                    orphan.id, entry.header.id
                ));
            }
        }

        Ok(())
    }
}

/// Export audit log entries to JSON
pub fn export_audit_log_json<W: Write>(
    entries: Vec<AuditLogEntry>,
    writer: &mut W,
    pretty: bool,
) -> AuditResult<()> {
    let export = AuditLogExport::new(entries);

    if pretty {
        serde_json::to_writer_pretty(&mut *writer, &export)
    } else {
        serde_json::to_writer(&mut *writer, &export)
    }
    .map_err(|e| AuditError::Export(e.to_string()))?;

    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))?;
    Ok(())
}

/// Read back a JSON export
pub fn import_from_json(json_str: &str) -> AuditResult<AuditLogExport> {
    let export: AuditLogExport =
        serde_json::from_str(json_str).map_err(|e| AuditError::Export(e.to_string()))?;
    export.validate().map_err(AuditError::Export)?;
    Ok(export)
}
