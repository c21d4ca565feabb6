//! Environment sensors: network quality, battery level and connectivity.
//!
//! Readings come from injected capability providers. A provider returning
//! `None` means the host lacks the capability; the sensor then assumes the
//! most permissive value (`fast`, `high`, online) so the scheduler degrades
//! to "always admit" rather than "always block".

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::util::types::{BatteryLevel, NetworkSpeed};

/// Source of network quality readings.
pub trait NetworkInfoProvider: Send + Sync {
    /// Current classification, or `None` when the host exposes no connection info.
    fn network_speed(&self) -> Option<NetworkSpeed>;

    /// Change notifications, if the host supports them.
    fn watch_network_speed(&self) -> Option<watch::Receiver<NetworkSpeed>> {
        None
    }
}

/// Source of battery readings.
pub trait BatteryInfoProvider: Send + Sync {
    /// Current classification, or `None` when the host exposes no battery info.
    fn battery_level(&self) -> Option<BatteryLevel>;

    /// Change notifications, if the host supports them.
    fn watch_battery_level(&self) -> Option<watch::Receiver<BatteryLevel>> {
        None
    }
}

/// Source of online/offline readings.
pub trait ConnectivityProvider: Send + Sync {
    /// Whether the host is online, or `None` when unknown.
    fn is_online(&self) -> Option<bool>;

    /// Change notifications, if the host supports them.
    fn watch_online(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// Process-wide sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorState {
    /// Network quality.
    pub network_speed: NetworkSpeed,
    /// Battery level.
    pub battery_level: BatteryLevel,
    /// Connectivity.
    pub is_online: bool,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            network_speed: NetworkSpeed::Fast,
            battery_level: BatteryLevel::High,
            is_online: true,
        }
    }
}

/// A single sensor update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorChange {
    /// New network classification.
    Network(NetworkSpeed),
    /// New battery classification.
    Battery(BatteryLevel),
    /// New connectivity.
    Online(bool),
}

/// Live sensor readings plus the change channels taken from the providers.
pub struct EnvironmentSensors {
    state: RwLock<SensorState>,
    subscriptions: Mutex<Option<SensorSubscriptions>>,
}

impl EnvironmentSensors {
    /// Subscribe to each provider's changes, then query it once for the
    /// initial readings.
    ///
    /// Subscribing first means a change published after construction is
    /// never lost, whether or not a listener is running yet.
    pub fn new(
        network: Arc<dyn NetworkInfoProvider>,
        battery: Arc<dyn BatteryInfoProvider>,
        connectivity: Arc<dyn ConnectivityProvider>,
    ) -> Self {
        let subscriptions = SensorSubscriptions {
            network: network.watch_network_speed(),
            battery: battery.watch_battery_level(),
            online: connectivity.watch_online(),
        };
        let defaults = SensorState::default();
        let network_speed = network.network_speed().unwrap_or_else(|| {
            tracing::info!("network information unavailable, assuming {}", defaults.network_speed);
            defaults.network_speed
        });
        let battery_level = battery.battery_level().unwrap_or_else(|| {
            tracing::info!("battery information unavailable, assuming {}", defaults.battery_level);
            defaults.battery_level
        });
        let is_online = connectivity.is_online().unwrap_or_else(|| {
            tracing::info!("connectivity information unavailable, assuming online");
            defaults.is_online
        });
        Self {
            state: RwLock::new(SensorState {
                network_speed,
                battery_level,
                is_online,
            }),
            subscriptions: Mutex::new(Some(subscriptions)),
        }
    }

    /// Current readings.
    pub fn snapshot(&self) -> SensorState {
        *self.state.read()
    }

    /// Current network classification.
    pub fn network_speed(&self) -> NetworkSpeed {
        self.state.read().network_speed
    }

    /// Current battery classification.
    pub fn battery_level(&self) -> BatteryLevel {
        self.state.read().battery_level
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.state.read().is_online
    }

    /// Apply an update in place. Returns the previous readings if anything changed.
    pub fn apply(&self, change: SensorChange) -> Option<SensorState> {
        let mut state = self.state.write();
        let previous = *state;
        match change {
            SensorChange::Network(speed) => state.network_speed = speed,
            SensorChange::Battery(level) => state.battery_level = level,
            SensorChange::Online(online) => state.is_online = online,
        }
        (previous != *state).then_some(previous)
    }

    /// Host changes published since the last call that no listener has
    /// consumed. Empty once the channels are taken.
    pub fn pending_changes(&self) -> Vec<SensorChange> {
        self.subscriptions
            .lock()
            .as_mut()
            .map(SensorSubscriptions::drain_changed)
            .unwrap_or_default()
    }

    /// Hand the change channels over to a listener. `None` after the first call.
    pub fn take_subscriptions(&self) -> Option<SensorSubscriptions> {
        self.subscriptions.lock().take()
    }
}

/// Change channels for each sensor; `None` where the host has no notifications.
pub struct SensorSubscriptions {
    /// Network quality changes.
    pub network: Option<watch::Receiver<NetworkSpeed>>,
    /// Battery changes.
    pub battery: Option<watch::Receiver<BatteryLevel>>,
    /// Connectivity changes.
    pub online: Option<watch::Receiver<bool>>,
}

fn latest_change<T: Copy>(rx: Option<&mut watch::Receiver<T>>) -> Option<T> {
    let rx = rx?;
    rx.has_changed().unwrap_or(false).then(|| *rx.borrow_and_update())
}

impl SensorSubscriptions {
    /// Latest unseen value of each channel, marking it seen.
    fn drain_changed(&mut self) -> Vec<SensorChange> {
        let mut changes = Vec::new();
        if let Some(speed) = latest_change(self.network.as_mut()) {
            changes.push(SensorChange::Network(speed));
        }
        if let Some(level) = latest_change(self.battery.as_mut()) {
            changes.push(SensorChange::Battery(level));
        }
        if let Some(online) = latest_change(self.online.as_mut()) {
            changes.push(SensorChange::Online(online));
        }
        changes
    }
}

/// Forward every value published on `rx` to `on_change` until the sender drops.
pub(crate) async fn forward_changes<T, F>(mut rx: watch::Receiver<T>, mut on_change: F)
where
    T: Copy + Send + Sync,
    F: FnMut(T) + Send,
{
    while rx.changed().await.is_ok() {
        let value = *rx.borrow_and_update();
        on_change(value);
    }
}
