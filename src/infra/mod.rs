//! Infrastructure adapters: the priority queue and default host capabilities.

pub mod environment;
pub mod hints;
pub mod queue;

pub use environment::{ManualEnvironment, PermissiveEnvironment};
pub use hints::{LoggingHintIssuer, NoServiceWorker};
pub use queue::InMemoryQueue;
