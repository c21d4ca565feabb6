//! Shared value types: priorities, resource kinds, lifecycle states and
//! sensor classifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::PrefetchError;

/// Priority tiers used for queue ordering.
///
/// Ordered so that `High > Medium > Low`; the queue dispatches the greatest
/// priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Cheap look-ahead work.
    Low,
    /// Default tier.
    #[default]
    Medium,
    /// Needed soon.
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// Kind of prefetchable resource. Determines the hint shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// A navigable page.
    Page,
    /// A lazily loaded UI component bundle.
    Component,
    /// An image.
    Image,
    /// A web font.
    Font,
    /// A script.
    Script,
    /// A stylesheet.
    Style,
    /// An API payload.
    Api,
    /// A data file.
    Data,
    /// Anything else; issued as a plain prefetch.
    Generic,
}

impl ResourceType {
    /// All named kinds, excluding [`ResourceType::Generic`].
    pub const NAMED: [Self; 8] = [
        Self::Page,
        Self::Component,
        Self::Image,
        Self::Font,
        Self::Script,
        Self::Style,
        Self::Api,
        Self::Data,
    ];

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Component => "component",
            Self::Image => "image",
            Self::Font => "font",
            Self::Script => "script",
            Self::Style => "style",
            Self::Api => "api",
            Self::Data => "data",
            Self::Generic => "generic",
        }
    }

    /// Parse a kind name, mapping anything unrecognized to `Generic`.
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or(Self::Generic)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = PrefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "page" => Ok(Self::Page),
            "component" => Ok(Self::Component),
            "image" => Ok(Self::Image),
            "font" => Ok(Self::Font),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "api" => Ok(Self::Api),
            "data" => Ok(Self::Data),
            "generic" => Ok(Self::Generic),
            _ => Err(PrefetchError::UnknownResourceType(s.to_string())),
        }
    }
}

/// Lifecycle state of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Queued, waiting for admission.
    Pending,
    /// Hint issued, awaiting completion.
    Loading,
    /// Fetched successfully.
    Loaded,
    /// Failed; either waiting on a retry timer or terminal.
    Failed,
}

/// Why a resource was requested. Informational only; admission uses live
/// sensor readings, never this label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PrefetchStrategy {
    /// Requested when the host had spare cycles.
    NetworkIdle,
    /// Requested because an element became visible.
    Visible,
    /// Requested on hover intent.
    Hover,
    /// Requested for immediate fetching.
    #[default]
    Immediate,
    /// Requested explicitly by the caller.
    Manual,
}

/// Cache mode forwarded by callers alongside a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Let the host decide.
    #[default]
    Default,
    /// Do not store the response.
    NoStore,
    /// Bypass the cache on the way out, refresh it on the way back.
    Reload,
    /// Revalidate before use.
    NoCache,
    /// Use any cached copy, however stale.
    ForceCache,
}

/// Coarse network quality classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkSpeed {
    /// 2g class links.
    Slow,
    /// 3g class links.
    Medium,
    /// 4g and better.
    Fast,
}

impl NetworkSpeed {
    /// Classify an effective connection type label (`slow-2g`, `2g`, `3g`, `4g`).
    ///
    /// Unknown labels classify as `Fast`.
    #[must_use]
    pub fn from_effective_type(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "slow-2g" | "2g" => Self::Slow,
            "3g" => Self::Medium,
            _ => Self::Fast,
        }
    }
}

impl fmt::Display for NetworkSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        })
    }
}

/// Coarse battery classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryLevel {
    /// Below 20%, not charging.
    Low,
    /// 20% to 50%, not charging.
    Medium,
    /// Above 50%, or charging.
    High,
}

impl BatteryLevel {
    /// Classify a charge fraction in `0.0..=1.0`.
    #[must_use]
    pub fn from_charge(fraction: f64, charging: bool) -> Self {
        if charging {
            return Self::High;
        }
        if fraction < 0.2 {
            Self::Low
        } else if fraction <= 0.5 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}
