//! Tests for utility functions

use std::str::FromStr;

use resource_prefetch::core::PrefetchError;
use resource_prefetch::util::{now_ms, BatteryLevel, NetworkSpeed, Priority, ResourceType};

#[test]
fn test_priority_ordering() {
    assert!(Priority::High > Priority::Medium);
    assert!(Priority::Medium > Priority::Low);
    assert_eq!(Priority::default(), Priority::Medium);
}

#[test]
fn test_resource_type_strict_and_lenient_parsing() {
    assert_eq!(ResourceType::from_str("font").unwrap(), ResourceType::Font);
    assert!(matches!(
        ResourceType::from_str("video"),
        Err(PrefetchError::UnknownResourceType(name)) if name == "video"
    ));
    assert_eq!(ResourceType::parse_lenient("video"), ResourceType::Generic);
    assert_eq!(ResourceType::parse_lenient("api"), ResourceType::Api);
}

#[test]
fn test_network_speed_classification() {
    assert_eq!(NetworkSpeed::from_effective_type("slow-2g"), NetworkSpeed::Slow);
    assert_eq!(NetworkSpeed::from_effective_type("2g"), NetworkSpeed::Slow);
    assert_eq!(NetworkSpeed::from_effective_type("3g"), NetworkSpeed::Medium);
    assert_eq!(NetworkSpeed::from_effective_type("4g"), NetworkSpeed::Fast);
}

#[test]
fn test_battery_classification() {
    assert_eq!(BatteryLevel::from_charge(0.1, false), BatteryLevel::Low);
    assert_eq!(BatteryLevel::from_charge(0.1, true), BatteryLevel::High);
    assert_eq!(BatteryLevel::from_charge(0.5, false), BatteryLevel::Medium);
    assert_eq!(BatteryLevel::from_charge(0.9, false), BatteryLevel::High);
}

#[test]
fn test_now_ms_is_monotonic_enough() {
    let a = now_ms();
    let b = now_ms();
    assert!(b >= a);
    assert!(a > 0);
}
