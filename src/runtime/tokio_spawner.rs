//! Tokio runtime spawner implementation.

use std::future::Future;
use std::sync::Arc;

use crate::core::{PrefetchError, Spawn};

/// Tokio-based spawner that executes tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: Arc<tokio::runtime::Handle>,
}

impl TokioSpawner {
    /// Create a new `TokioSpawner` from a tokio runtime handle.
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Spawner over the runtime the caller is running on.
    pub fn current() -> Result<Self, PrefetchError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|e| PrefetchError::Backend(format!("no tokio runtime: {e}")))
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}
