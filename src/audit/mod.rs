//! Audit logging system for shopfloor
//!
//! Records every create, update and delete of estimates, links, bundles,
//! workorders and invoices with before/after snapshots in an append-only
//! JSONL file.
//!
//! - `AuditEntry`: one operation on one entity, with optional actor
//! - `AuditLogger`: appends entries and reads them back
//! - `generate_diff` / `diff_of`: one-line summaries of what changed

mod diff;
mod entry;
mod logger;

pub use diff::{diff_of, generate_diff};
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
