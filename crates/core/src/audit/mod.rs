//! Audit trail contract.
//!
//! The engine writes one [`AuditEntry`] per operation outcome. Sinks are best-effort:
//! they sit outside the consistency path and their failures never change a result.

pub mod sink;
pub mod types;

pub use sink::{AuditError, AuditSink, TracingAuditSink};
pub use types::{AuditEntry, AuditOutcome};
