//! # Resource Prefetch
//!
//! An environment-aware prefetch scheduler for client applications.
//!
//! Callers (or trigger bindings) submit resource urls with a type and a
//! priority. The scheduler keeps them in a stable priority queue and, right
//! before dispatch, asks an admission policy whether the current network
//! quality, battery level and connectivity allow the fetch. Admitted entries
//! are turned into a type-appropriate fetch hint and handed to the host;
//! failures are retried with exponential backoff and, once exhausted, parked
//! until connectivity comes back.
//!
//! ## Key Features
//!
//! - **Stable priority queue**: high before medium before low, FIFO within a tier
//! - **Sensor-aware admission**: offline, low battery and slow links hold work back
//! - **Type dispatcher**: page, component, image, font, script, style, api and data hints
//! - **Bounded retries**: exponential backoff, reconnection sweep for terminal failures
//! - **Trigger bindings**: first visibility, debounced hover and idle time
//! - **Observable**: `tracing` logs, a broadcast event stream and a status poller
//!
//! ```rust,ignore
//! use resource_prefetch::builders::PrefetchServiceBuilder;
//! use resource_prefetch::config::PrefetchServiceConfig;
//! use resource_prefetch::util::types::ResourceType;
//!
//! let service = PrefetchServiceBuilder::new(PrefetchServiceConfig::from_env()?)
//!     .with_hint_issuer(my_issuer)
//!     .build()?;
//! service.start();
//!
//! service.prefetch_resource("/courses", ResourceType::Page, None);
//! let status = service.status();
//! ```
//!
//! Host capabilities are injected as traits; any capability left out falls
//! back to a permissive stand-in, so the same code runs headless, in tests
//! and inside a real client shell.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Scheduling core: registry, admission, dispatch, retry and trigger bindings.
pub mod core;
/// Service configuration.
pub mod config;
/// Builders to construct the service from configuration and host capabilities.
pub mod builders;
/// Infrastructure adapters for the queue and default host capabilities.
pub mod infra;
/// Runtime adapters and the reactive status surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
