//! audit-trail - Snapshot-diff audit engine
//!
//! This library records the history of persisted entities. Before a mutation
//! it captures the entity's current state, after the mutation it re-reads the
//! state, and every changed field becomes an audit delta under a single audit
//! header. Headers written during one request share a correlation id.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `audit`: Snapshot reading, diffing, recording and the lifecycle controller
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Entity records, snapshots, audit headers and deltas
//! - `storage`: Store traits and the JSON file storage layer
//! - `services`: Audited entity writes and audit log reads
//! - `cli`: Command handlers for the `audit-trail` binary
//! - `display`: Terminal formatting
//! - `export`: JSON and YAML export of the audit log
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::audit::{AuditedStore, RequestContext};
//! use audit_trail::models::{EntityRecord, EntitySchema};
//!
//! let ctx = RequestContext::new();
//! let mut audited = AuditedStore::new(&storage, EntitySchema::default());
//! audited.create(&ctx, "Person", EntityRecord::new("1").with_field("name", "Alice"))?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{AuditError, AuditResult};
