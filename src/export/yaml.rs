//! YAML Export functionality
//!
//! Exports audit log entries to YAML for human-readable review.

use crate::error::{AuditError, AuditResult};
use crate::export::json::AuditLogExport;
use crate::models::AuditLogEntry;
use std::io::Write;

/// Export audit log entries to YAML
pub fn export_audit_log_yaml<W: Write>(entries: Vec<AuditLogEntry>, writer: &mut W) -> AuditResult<()> {
    let export = AuditLogExport::new(entries);

    writeln!(writer, "# audit-trail log export")
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer, "# Generated: {}", export.exported_at)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer, "# App Version: {}", export.app_version)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| AuditError::Export(e.to_string()))?;

    Ok(())
}

/// Read back a YAML export
pub fn import_from_yaml(yaml_str: &str) -> AuditResult<AuditLogExport> {
    let export: AuditLogExport =
        serde_yaml::from_str(yaml_str).map_err(|e| AuditError::Export(e.to_string()))?;

    export.validate().map_err(AuditError::Export)?;

    Ok(export)
}
