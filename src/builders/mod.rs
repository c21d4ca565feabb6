//! Builders to construct the prefetch service from configuration and host
//! capabilities.

pub mod service_builder;

pub use service_builder::PrefetchServiceBuilder;
