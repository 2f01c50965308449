//! Display formatting for terminal output
//!
//! Provides utilities for formatting entity records and the audit log for
//! terminal display.

pub mod audit;
pub mod entity;

pub use audit::{format_audit_entry, format_audit_log};
pub use entity::format_entity;
