//! Error types for prefetch operations.

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Fetch failures are absorbed by the retry scheduler and never reach callers
/// of [`crate::core::PrefetchService`]; they only appear here so executors and
/// host adapters have something typed to return.
#[derive(Debug, Error)]
pub enum PrefetchError {
    /// A resource kind name was not recognized by strict parsing.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),
    /// The host rejected or failed a fetch hint.
    #[error("hint failed for {url}: {reason}")]
    HintFailed {
        /// Resource the hint was issued for.
        url: String,
        /// Host supplied reason.
        reason: String,
    },
    /// The host gave up waiting on a fetch hint.
    #[error("hint timed out for {0}")]
    HintTimeout(String),
    /// Background service registration failed.
    #[error("service worker registration failed: {0}")]
    ServiceWorker(String),
    /// Configuration values are invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
