//! Service layer for audit-trail
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation and running every write through the audit engine.

pub mod audit_log;
pub mod entity;

pub use audit_log::AuditLogService;
pub use entity::{EntityChange, EntityPatch, EntityService};
