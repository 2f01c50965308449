//! Storage initialization
//!
//! Handles first-run setup of the data directory and empty data files.

use crate::config::paths::AuditPaths;
use crate::error::AuditError;

use super::file_io::write_json_atomic;

/// Initialize storage for a fresh installation
///
/// Existing data files are left untouched.
pub fn initialize_storage(paths: &AuditPaths) -> Result<(), AuditError> {
    paths.ensure_directories()?;

    if !paths.entities_file().exists() {
        write_json_atomic(paths.entities_file(), &serde_json::json!({ "entities": {} }))?;
    }

    if !paths.audits_file().exists() {
        write_json_atomic(
            paths.audits_file(),
            &serde_json::json!({ "headers": [], "deltas": [] }),
        )?;
    }

    tracing::debug!(data_dir = %paths.data_dir().display(), "storage initialized");
    Ok(())
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &AuditPaths) -> bool {
    !paths.entities_file().exists() || !paths.audits_file().exists()
}
