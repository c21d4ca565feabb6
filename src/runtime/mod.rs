//! Runtime adapters and the reactive status surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{PrefetchView, StatusPoller};
pub use tokio_spawner::TokioSpawner;
