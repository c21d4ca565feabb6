//! Sensor providers: a permissive stand-in for hosts without capabilities and a
//! manually driven provider for tests, configuration and host adapters.

use tokio::sync::watch;

use crate::core::sensors::{BatteryInfoProvider, ConnectivityProvider, NetworkInfoProvider, SensorState};
use crate::util::types::{BatteryLevel, NetworkSpeed};

/// Provider for hosts exposing none of the sensor capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveEnvironment;

impl NetworkInfoProvider for PermissiveEnvironment {
    fn network_speed(&self) -> Option<NetworkSpeed> {
        None
    }
}

impl BatteryInfoProvider for PermissiveEnvironment {
    fn battery_level(&self) -> Option<BatteryLevel> {
        None
    }
}

impl ConnectivityProvider for PermissiveEnvironment {
    fn is_online(&self) -> Option<bool> {
        None
    }
}

/// Provider whose readings are pushed in by the owner.
///
/// Every setter publishes on a `watch` channel, so a running
/// [`crate::core::PrefetchService`] built over this provider picks the change
/// up through its sensor listeners.
pub struct ManualEnvironment {
    network: watch::Sender<NetworkSpeed>,
    battery: watch::Sender<BatteryLevel>,
    online: watch::Sender<bool>,
}

impl ManualEnvironment {
    /// Provider starting at `initial`.
    #[must_use]
    pub fn new(initial: SensorState) -> Self {
        Self {
            network: watch::Sender::new(initial.network_speed),
            battery: watch::Sender::new(initial.battery_level),
            online: watch::Sender::new(initial.is_online),
        }
    }

    /// Publish a network classification.
    pub fn set_network_speed(&self, speed: NetworkSpeed) {
        self.network.send_replace(speed);
    }

    /// Publish a battery classification.
    pub fn set_battery_level(&self, level: BatteryLevel) {
        self.battery.send_replace(level);
    }

    /// Publish connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.send_replace(online);
    }
}

impl Default for ManualEnvironment {
    fn default() -> Self {
        Self::new(SensorState::default())
    }
}

impl NetworkInfoProvider for ManualEnvironment {
    fn network_speed(&self) -> Option<NetworkSpeed> {
        Some(*self.network.borrow())
    }

    fn watch_network_speed(&self) -> Option<watch::Receiver<NetworkSpeed>> {
        Some(self.network.subscribe())
    }
}

impl BatteryInfoProvider for ManualEnvironment {
    fn battery_level(&self) -> Option<BatteryLevel> {
        Some(*self.battery.borrow())
    }

    fn watch_battery_level(&self) -> Option<watch::Receiver<BatteryLevel>> {
        Some(self.battery.subscribe())
    }
}

impl ConnectivityProvider for ManualEnvironment {
    fn is_online(&self) -> Option<bool> {
        Some(*self.online.borrow())
    }

    fn watch_online(&self) -> Option<watch::Receiver<bool>> {
        Some(self.online.subscribe())
    }
}
