//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use resource_prefetch::builders::PrefetchServiceBuilder;
use resource_prefetch::config::PrefetchServiceConfig;
use resource_prefetch::core::{PrefetchError, SensorState};
use resource_prefetch::infra::ManualEnvironment;
use resource_prefetch::util::{BatteryLevel, NetworkSpeed};

#[test]
fn test_builder_defaults() {
    let builder = PrefetchServiceBuilder::default();
    assert_eq!(builder.config(), &PrefetchServiceConfig::default());
}

#[test]
fn test_build_outside_runtime_fails() {
    let result = PrefetchServiceBuilder::default().build();
    assert!(matches!(result, Err(PrefetchError::Backend(_))));
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    let config = PrefetchServiceConfig::new().with_status_interval(Duration::ZERO);
    let result = PrefetchServiceBuilder::new(config).build();
    assert!(matches!(result, Err(PrefetchError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_build_with_permissive_host() {
    let service = PrefetchServiceBuilder::default().build().unwrap();
    assert_eq!(service.network_speed(), NetworkSpeed::Fast);
    assert_eq!(service.battery_level(), BatteryLevel::High);
    assert!(service.is_online());
    assert_eq!(service.status().total, 0);
}

#[tokio::test]
async fn test_build_reads_initial_sensor_values() {
    let env = Arc::new(ManualEnvironment::new(SensorState {
        network_speed: NetworkSpeed::Slow,
        battery_level: BatteryLevel::Medium,
        is_online: false,
    }));
    let service = PrefetchServiceBuilder::default()
        .with_environment(env)
        .build()
        .unwrap();
    assert_eq!(service.network_speed(), NetworkSpeed::Slow);
    assert_eq!(service.battery_level(), BatteryLevel::Medium);
    assert!(!service.is_online());
}
