//! Reactive status surface for UI bindings.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::core::{SensorState, StatusSnapshot};

/// Everything a status widget renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchView {
    /// Resource counters.
    pub status: StatusSnapshot,
    /// Sensor readings.
    pub sensors: SensorState,
}

/// Observable view refreshed on every transition and on the status tick.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    rx: watch::Receiver<PrefetchView>,
}

impl StatusPoller {
    pub(crate) const fn new(rx: watch::Receiver<PrefetchView>) -> Self {
        Self { rx }
    }

    /// Latest view.
    #[must_use]
    pub fn current(&self) -> PrefetchView {
        *self.rx.borrow()
    }

    /// Wait for the next change. `None` once the service is gone.
    pub async fn changed(&mut self) -> Option<PrefetchView> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
