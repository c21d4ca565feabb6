//! Audit trail of resource transitions.
//!
//! Every state change of a tracked resource can be recorded for diagnostics.
//! The in-memory sink keeps a bounded ring of the most recent events.

use std::collections::VecDeque;

use uuid::Uuid;

use crate::util::clock::now_ms;

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Unique event identifier.
    pub event_id: String,
    /// Resource the event concerns.
    pub url: String,
    /// Action taken (submit, defer, dispatch, load, retry, fail, resubmit).
    pub action: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events.min(1024)),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    url: impl Into<String>,
    action: impl Into<String>,
    detail: Option<String>,
) -> AuditEvent {
    let url = url.into();
    let action = action.into();
    let created_at_ms = now_ms();
    AuditEvent {
        event_id: Uuid::new_v4().to_string(),
        url,
        action,
        created_at_ms,
        detail,
    }
}
