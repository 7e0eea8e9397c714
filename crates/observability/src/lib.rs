//! Tracing, logging and the audit trail (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Audit collaborator: who did what, and whether it was allowed.
pub mod audit;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use audit::{AuditEvent, AuditOutcome, AuditSink, MemoryAuditSink, TracingAuditSink};
