//! Configuration models for the prefetch service.

pub mod prefetch;

pub use prefetch::PrefetchServiceConfig;
