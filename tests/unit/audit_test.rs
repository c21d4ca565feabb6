//! Tests for audit sink

use resource_prefetch::core::{build_audit_event, AuditSink, InMemoryAuditSink};

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event("/courses", "submit", Some("page/high".to_string()));

    sink.record(event.clone());
    assert_eq!(sink.events().len(), 1);

    let events = sink.events();
    assert_eq!(events[0], event);
    assert_eq!(events[0].url, "/courses");
    assert_eq!(events[0].action, "submit");
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event("/a", "submit", None));
    sink.record(build_audit_event("/b", "submit", None));
    sink.record(build_audit_event("/c", "submit", None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].url, "/b"); // First one popped
    assert_eq!(events[1].url, "/c");
}

#[test]
fn test_zero_capacity_sink_drops_everything() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(build_audit_event("/a", "load", None));
    assert!(sink.events().is_empty());
}

#[test]
fn test_build_audit_event() {
    let event = build_audit_event("/img/a.png", "retry", Some("hint failed".to_string()));

    assert_eq!(event.url, "/img/a.png");
    assert_eq!(event.action, "retry");
    assert_eq!(event.detail, Some("hint failed".to_string()));
    assert!(uuid::Uuid::parse_str(&event.event_id).is_ok());
    assert!(event.created_at_ms > 0);
}

#[test]
fn test_repeated_actions_get_distinct_ids() {
    let first = build_audit_event("/a", "defer", None);
    let second = build_audit_event("/a", "defer", None);

    assert_ne!(first.event_id, second.event_id);
}
