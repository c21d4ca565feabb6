//! Tests for error types

use resource_prefetch::core::PrefetchError;

#[test]
fn test_unknown_resource_type_error() {
    let err = PrefetchError::UnknownResourceType("video".to_string());
    assert_eq!(format!("{}", err), "unknown resource type: video");
}

#[test]
fn test_hint_failed_error() {
    let err = PrefetchError::HintFailed {
        url: "/courses".to_string(),
        reason: "network error".to_string(),
    };
    assert_eq!(format!("{}", err), "hint failed for /courses: network error");
}

#[test]
fn test_hint_timeout_error() {
    let err = PrefetchError::HintTimeout("/img/a.png".to_string());
    assert_eq!(format!("{}", err), "hint timed out for /img/a.png");
}

#[test]
fn test_invalid_config_error() {
    let err = PrefetchError::InvalidConfig("event_capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: event_capacity must be greater than 0"
    );
}

#[test]
fn test_backend_error() {
    let err = PrefetchError::Backend("no tokio runtime".to_string());
    assert_eq!(format!("{}", err), "backend error: no tokio runtime");
}
