//! Tracked resources and the caller-supplied submission config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::clock::now_ms;
use crate::util::types::{CachePolicy, PrefetchStrategy, Priority, ResourceStatus, ResourceType};

/// Caller hint accompanying a submission.
///
/// Only `priority` is carried into the [`ResourceEntry`]; the remaining fields
/// describe intent and are logged with the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Why the resource was requested.
    #[serde(default)]
    pub strategy: PrefetchStrategy,
    /// Queue tier.
    #[serde(default)]
    pub priority: Priority,
    /// Requested cache mode.
    #[serde(default)]
    pub cache_policy: CachePolicy,
    /// Declarative timeout; enforcement is up to the hint issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Requested retry count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
}

impl PrefetchConfig {
    /// Config with the given priority and defaults elsewhere.
    #[must_use]
    pub fn with_priority(priority: Priority) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Replace the strategy label.
    #[must_use]
    pub const fn strategy(mut self, strategy: PrefetchStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// One tracked prefetch candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Resource identifier; the dedup key.
    pub url: String,
    /// Kind of resource.
    pub kind: ResourceType,
    /// Queue tier.
    pub priority: Priority,
    /// Lifecycle state.
    pub status: ResourceStatus,
    /// Creation time in milliseconds since epoch. FIFO tiebreaker.
    pub timestamp: u128,
    /// Submission sequence number, breaks ties between equal timestamps.
    pub seq: u64,
    /// Time of the last state transition in milliseconds since epoch.
    pub last_accessed: u128,
    /// Failed attempts so far.
    pub retry_count: u32,
}

impl ResourceEntry {
    /// Build a fresh `pending` entry.
    #[must_use]
    pub fn new(url: impl Into<String>, kind: ResourceType, priority: Priority, seq: u64) -> Self {
        let now = now_ms();
        Self {
            url: url.into(),
            kind,
            priority,
            status: ResourceStatus::Pending,
            timestamp: now,
            seq,
            last_accessed: now,
            retry_count: 0,
        }
    }

    /// Move to `status` and stamp `last_accessed`.
    pub fn transition(&mut self, status: ResourceStatus) {
        self.status = status;
        self.last_accessed = now_ms().max(self.last_accessed);
    }

    /// Whether the entry blocks a new submission for the same url.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, ResourceStatus::Pending | ResourceStatus::Loading)
    }
}
