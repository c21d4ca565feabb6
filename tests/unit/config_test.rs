//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use resource_prefetch::config::PrefetchServiceConfig;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let cfg = PrefetchServiceConfig::default();
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.retry_base_delay_ms, 1000);
    assert_eq!(cfg.hover_delay(), Duration::from_millis(100));
    assert_eq!(cfg.status_interval(), Duration::from_secs(1));
    assert_eq!(cfg.max_tracked_resources, None);
    assert_eq!(cfg.service_worker_script.as_deref(), Some("/sw.js"));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_retry_policy_from_config() {
    let policy = PrefetchServiceConfig::new()
        .with_max_retries(5)
        .with_retry_base_delay(Duration::from_millis(10))
        .retry_policy();
    assert_eq!(policy.max_retries, 5);
    assert_eq!(policy.base_delay, Duration::from_millis(10));
}

#[test]
fn test_invalid_status_interval() {
    let cfg = PrefetchServiceConfig::new().with_status_interval(Duration::ZERO);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_event_capacity() {
    let cfg = PrefetchServiceConfig::new().with_event_capacity(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_invalid_max_tracked() {
    let cfg = PrefetchServiceConfig::new().with_max_tracked_resources(Some(0));
    assert!(cfg.validate().is_err());
    let cfg = PrefetchServiceConfig::new().with_max_tracked_resources(Some(10));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_invalid_service_worker_script() {
    let cfg = PrefetchServiceConfig::new().with_service_worker_script(Some("  ".into()));
    assert!(cfg.validate().is_err());
    let cfg = PrefetchServiceConfig::new().with_service_worker_script(None);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_from_json_partial() {
    let cfg = PrefetchServiceConfig::from_json_str(r#"{"max_retries": 1, "hover_delay_ms": 250}"#).unwrap();
    assert_eq!(cfg.max_retries, 1);
    assert_eq!(cfg.hover_delay_ms, 250);
    assert_eq!(cfg.retry_base_delay_ms, 1000);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(PrefetchServiceConfig::from_json_str(r#"{"event_capacity": 0}"#).is_err());
    assert!(PrefetchServiceConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup_overrides() {
    let cfg = PrefetchServiceConfig::from_lookup(lookup(&[
        ("PREFETCH_MAX_RETRIES", "2"),
        ("PREFETCH_RETRY_BASE_DELAY_MS", "50"),
        ("PREFETCH_MAX_TRACKED_RESOURCES", "128"),
        ("PREFETCH_SERVICE_WORKER_SCRIPT", "none"),
    ]))
    .unwrap();
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_base_delay_ms, 50);
    assert_eq!(cfg.max_tracked_resources, Some(128));
    assert_eq!(cfg.service_worker_script, None);
    assert_eq!(cfg.hover_delay_ms, 100);
}

#[test]
fn test_from_lookup_empty_uses_defaults() {
    let cfg = PrefetchServiceConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg, PrefetchServiceConfig::default());
}

#[test]
fn test_from_lookup_rejects_garbage() {
    let err = PrefetchServiceConfig::from_lookup(lookup(&[("PREFETCH_MAX_RETRIES", "three")])).unwrap_err();
    assert!(err.to_string().contains("PREFETCH_MAX_RETRIES"));
    assert!(PrefetchServiceConfig::from_lookup(lookup(&[("PREFETCH_EVENT_CAPACITY", "0")])).is_err());
}
