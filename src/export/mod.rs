//! Export module for audit-trail
//!
//! Provides audit log export in machine-readable formats:
//! - JSON: schema-versioned, for tooling
//! - YAML: for human review

pub mod json;
pub mod yaml;

pub use json::{export_audit_log_json, import_from_json, AuditLogExport, ExportMetadata, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_audit_log_yaml, import_from_yaml};
