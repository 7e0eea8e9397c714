//! Audit trail.
//!
//! Every authentication, authorization and registry mutation is reported as an
//! [`AuditEvent`] to an [`AuditSink`]. Recording is infallible by signature:
//! a sink that cannot deliver an event drops it, and the primary operation
//! carries on.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Result of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    Denied,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
            AuditOutcome::Denied => "denied",
        }
    }
}

/// One `(event, app_id, role, outcome)` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub event: &'static str,
    pub app_id: Option<String>,
    pub role: Option<String>,
    pub outcome: AuditOutcome,
    /// Internal detail (error kinds, denial reasons). Never shown to callers.
    pub detail: Option<String>,
}

impl AuditEvent {
    pub fn new(event: &'static str, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::now_v7(),
            at: Utc::now(),
            event,
            app_id: None,
            role: None,
            outcome,
            detail: None,
        }
    }

    pub fn app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Receiver of audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

impl<S> AuditSink for std::sync::Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: AuditEvent) {
        (**self).record(event)
    }
}

/// Emits audit events as structured `tracing` records on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let app_id = event.app_id.as_deref().unwrap_or("-");
        let role = event.role.as_deref().unwrap_or("-");
        let detail = event.detail.as_deref().unwrap_or("");

        match event.outcome {
            AuditOutcome::Success => tracing::info!(
                target: "audit",
                audit_id = %event.id,
                event = event.event,
                app_id,
                role,
                outcome = event.outcome.as_str(),
                detail,
            ),
            AuditOutcome::Failure | AuditOutcome::Denied => tracing::warn!(
                target: "audit",
                audit_id = %event.id,
                event = event.event,
                app_id,
                role,
                outcome = event.outcome.as_str(),
                detail,
            ),
        }
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    inner: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        match self.inner.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.events().len()
    }

    /// Events with the given name, in recording order.
    pub fn named(&self, event: &str) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|e| e.event == event).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        // A poisoned lock still holds a usable Vec; keep recording.
        match self.inner.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
