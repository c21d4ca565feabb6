//! Admission policy: may a queued entry be dispatched right now?
//!
//! Evaluated immediately before dispatch against live sensor readings, never at
//! submission time.

use serde::{Deserialize, Serialize};

use super::{ResourceEntry, SensorState};
use crate::util::types::{BatteryLevel, NetworkSpeed, Priority, ResourceStatus};

/// Why an entry was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferReason {
    /// Host is offline.
    Offline,
    /// Battery is low.
    LowBattery,
    /// High priority fetch on a slow network.
    SlowNetwork,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdmissionDecision {
    /// Dispatch now.
    Admit,
    /// Keep queued and re-evaluate later.
    Defer(DeferReason),
    /// Already loaded or loading; drop this queue copy.
    Duplicate,
}

impl AdmissionDecision {
    /// Whether the entry may proceed.
    #[must_use]
    pub const fn is_admit(self) -> bool {
        matches!(self, Self::Admit)
    }
}

/// Decides whether a queued entry may be dispatched.
pub trait AdmissionPolicy: Send + Sync {
    /// Evaluate `entry` given the live `sensors` and the registry's current
    /// status for its url.
    fn evaluate(
        &self,
        entry: &ResourceEntry,
        sensors: &SensorState,
        current: Option<ResourceStatus>,
    ) -> AdmissionDecision;

    /// Boolean form of [`AdmissionPolicy::evaluate`].
    fn should_admit(
        &self,
        entry: &ResourceEntry,
        sensors: &SensorState,
        current: Option<ResourceStatus>,
    ) -> bool {
        self.evaluate(entry, sensors, current).is_admit()
    }
}

/// Default policy over sensor readings. Rules apply in order, first match wins:
///
/// 1. offline: defer
/// 2. low battery: defer, whatever the priority
/// 3. slow network and high priority: defer; slow links only carry cheap
///    look-ahead (`medium`/`low`)
/// 4. already loaded or loading: duplicate
/// 5. otherwise admit
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorAdmissionPolicy;

impl AdmissionPolicy for SensorAdmissionPolicy {
    fn evaluate(
        &self,
        entry: &ResourceEntry,
        sensors: &SensorState,
        current: Option<ResourceStatus>,
    ) -> AdmissionDecision {
        if !sensors.is_online {
            return AdmissionDecision::Defer(DeferReason::Offline);
        }
        if sensors.battery_level == BatteryLevel::Low {
            return AdmissionDecision::Defer(DeferReason::LowBattery);
        }
        if sensors.network_speed == NetworkSpeed::Slow && entry.priority == Priority::High {
            return AdmissionDecision::Defer(DeferReason::SlowNetwork);
        }
        if matches!(current, Some(ResourceStatus::Loaded | ResourceStatus::Loading)) {
            return AdmissionDecision::Duplicate;
        }
        AdmissionDecision::Admit
    }
}
