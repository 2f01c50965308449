//! Configuration module for audit-trail
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Per-entity audit settings persistence

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::{EntitySettings, Settings};
