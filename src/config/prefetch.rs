//! Prefetch service configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, RetryPolicy};

/// Tunables of a [`crate::core::PrefetchService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchServiceConfig {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// Backoff unit in milliseconds; retry `n` waits `base * 2^n`.
    pub retry_base_delay_ms: u64,
    /// Hover debounce in milliseconds.
    pub hover_delay_ms: u64,
    /// Status refresh interval for reactive bindings, in milliseconds.
    pub status_interval_ms: u64,
    /// Upper bound on tracked resources; `None` keeps everything.
    pub max_tracked_resources: Option<usize>,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Service script registered at start, if any.
    pub service_worker_script: Option<String>,
}

impl Default for PrefetchServiceConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_ms: 1000,
            hover_delay_ms: 100,
            status_interval_ms: 1000,
            max_tracked_resources: None,
            event_capacity: 256,
            service_worker_script: Some("/sw.js".into()),
        }
    }
}

impl PrefetchServiceConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry bound.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff unit.
    #[must_use]
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the hover debounce.
    #[must_use]
    pub fn with_hover_delay(mut self, delay: Duration) -> Self {
        self.hover_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the status refresh interval.
    #[must_use]
    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Bound the registry.
    #[must_use]
    pub const fn with_max_tracked_resources(mut self, max: Option<usize>) -> Self {
        self.max_tracked_resources = max;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub const fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set or disable the service script.
    #[must_use]
    pub fn with_service_worker_script(mut self, script: Option<String>) -> Self {
        self.service_worker_script = script;
        self
    }

    /// Retry policy derived from this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Hover debounce.
    #[must_use]
    pub const fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }

    /// Status refresh interval.
    #[must_use]
    pub const fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.status_interval_ms == 0 {
            return Err("status_interval_ms must be greater than 0".into());
        }
        if self.event_capacity == 0 {
            return Err("event_capacity must be greater than 0".into());
        }
        if self.max_tracked_resources == Some(0) {
            return Err("max_tracked_resources must be greater than 0 when set".into());
        }
        if self
            .service_worker_script
            .as_deref()
            .is_some_and(|s| s.trim().is_empty())
        {
            return Err("service_worker_script must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `PREFETCH_*` environment variables, loading a
    /// `.env` file first if one exists. Unset variables keep their defaults.
    ///
    /// Recognized: `PREFETCH_MAX_RETRIES`, `PREFETCH_RETRY_BASE_DELAY_MS`,
    /// `PREFETCH_HOVER_DELAY_MS`, `PREFETCH_STATUS_INTERVAL_MS`,
    /// `PREFETCH_MAX_TRACKED_RESOURCES`, `PREFETCH_EVENT_CAPACITY`,
    /// `PREFETCH_SERVICE_WORKER_SCRIPT` (empty or `none` disables it).
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> AppResult<Option<T>>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            lookup(key)
                .map(|raw| raw.trim().parse::<T>().with_context(|| format!("invalid {key}: {raw}")))
                .transpose()
        }

        let mut cfg = Self::default();
        if let Some(v) = parse::<u32>(&lookup, "PREFETCH_MAX_RETRIES")? {
            cfg.max_retries = v;
        }
        if let Some(v) = parse::<u64>(&lookup, "PREFETCH_RETRY_BASE_DELAY_MS")? {
            cfg.retry_base_delay_ms = v;
        }
        if let Some(v) = parse::<u64>(&lookup, "PREFETCH_HOVER_DELAY_MS")? {
            cfg.hover_delay_ms = v;
        }
        if let Some(v) = parse::<u64>(&lookup, "PREFETCH_STATUS_INTERVAL_MS")? {
            cfg.status_interval_ms = v;
        }
        if let Some(v) = parse::<usize>(&lookup, "PREFETCH_MAX_TRACKED_RESOURCES")? {
            cfg.max_tracked_resources = Some(v);
        }
        if let Some(v) = parse::<usize>(&lookup, "PREFETCH_EVENT_CAPACITY")? {
            cfg.event_capacity = v;
        }
        if let Some(script) = lookup("PREFETCH_SERVICE_WORKER_SCRIPT") {
            let script = script.trim();
            cfg.service_worker_script =
                (!script.is_empty() && !script.eq_ignore_ascii_case("none")).then(|| script.to_string());
        }
        cfg.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(cfg)
    }
}
