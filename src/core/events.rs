//! Events published on every scheduler state transition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DeferReason, SensorState};
use crate::util::types::{Priority, ResourceType};

/// A scheduler state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PrefetchEvent {
    /// A new pending entry was queued.
    Queued {
        /// Resource.
        url: String,
        /// Kind.
        kind: ResourceType,
        /// Tier.
        priority: Priority,
    },
    /// Admission held an entry back.
    Deferred {
        /// Resource.
        url: String,
        /// Why.
        reason: DeferReason,
    },
    /// The hint for an entry was issued.
    Dispatched {
        /// Resource.
        url: String,
        /// Kind.
        kind: ResourceType,
        /// Retry number of this attempt, 0 for the first.
        attempt: u32,
    },
    /// The hint completed.
    Loaded {
        /// Resource.
        url: String,
    },
    /// The hint failed and a retry is scheduled.
    RetryScheduled {
        /// Resource.
        url: String,
        /// Retry number, starting at 1.
        attempt: u32,
        /// Backoff before requeueing.
        delay: Duration,
    },
    /// Retries are exhausted.
    Failed {
        /// Resource.
        url: String,
        /// Last failure.
        reason: String,
    },
    /// A terminal-failed entry was resubmitted after connectivity returned.
    Resubmitted {
        /// Resource.
        url: String,
    },
    /// Pending entries were dropped (`all = false`) or the registry was reset.
    Cleared {
        /// Whether loaded/failed bookkeeping and bindings were reset too.
        all: bool,
    },
    /// Sensor readings changed.
    SensorsChanged(SensorState),
}

impl PrefetchEvent {
    /// Resource the event concerns, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Queued { url, .. }
            | Self::Deferred { url, .. }
            | Self::Dispatched { url, .. }
            | Self::Loaded { url }
            | Self::RetryScheduled { url, .. }
            | Self::Failed { url, .. }
            | Self::Resubmitted { url } => Some(url),
            Self::Cleared { .. } | Self::SensorsChanged(_) => None,
        }
    }
}
