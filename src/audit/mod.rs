//! Snapshot-diff audit engine
//!
//! Captures an entity's persisted state before a mutation, re-reads it after
//! the mutation commits, and records what changed as one audit header plus
//! one delta per changed field.
//!
//! # Architecture
//!
//! - `RequestContext`: per-request correlation id and acting identity
//! - `read_snapshot`: loads the current state, folding tracked many-to-many
//!   relations into sorted id lists
//! - `compute_deltas`: field-by-field comparison of two snapshots
//! - `record`: writes the header and its deltas through an `AuditStore`
//! - `AuditableController`: drives the save/delete lifecycle of one type
//! - `AuditedStore`: runs that lifecycle around a store's own writes
//!
//! # Example
//!
//! ```rust,ignore
//! use audit_trail::audit::{AuditableController, RequestContext};
//!
//! let ctx = RequestContext::new();
//! let mut controller = AuditableController::new("Person", config, &schema);
//!
//! controller.before_save(&storage, Some("1"))?;
//! let created = storage.save("Person", record)?;
//! controller.after_save(&ctx, &storage, "1", created)?;
//! ```

mod audited;
mod context;
mod controller;
mod diff;
mod hooks;
mod recorder;
mod snapshot;

pub use audited::AuditedStore;
pub use context::{IdentitySource, RequestContext, StaticIdentity};
pub use controller::AuditableController;
pub use diff::{compute_deltas, is_blank, summarize, values_differ, DiffMode};
pub(crate) use diff::format_value;
pub use hooks::{AuditHooks, ConfiguredHooks, NoHooks};
pub use recorder::{record, should_record, RecordRequest};
pub use snapshot::{build_snapshot, join_related_ids, read_for_delete, read_snapshot};
