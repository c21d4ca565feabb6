//! Shared host doubles and event helpers for service tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, Notify};

use resource_prefetch::core::{
    ElementId, IdleFuture, IdleScheduler, PointerEvent, PointerEventSource, PrefetchError, PrefetchEvent,
    ResourceHint, ResourceHintIssuer, ViewportObserver,
};

/// Issuer that records every hint and fails the first `failures` calls.
pub struct RecordingIssuer {
    calls: Mutex<Vec<ResourceHint>>,
    failures: AtomicUsize,
}

impl RecordingIssuer {
    pub fn succeeding() -> Arc<Self> {
        Self::failing(0)
    }

    pub fn failing(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(failures),
        })
    }

    pub fn always_failing() -> Arc<Self> {
        Self::failing(usize::MAX)
    }

    pub fn calls(&self) -> Vec<ResourceHint> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().iter().filter(|h| h.url == url).count()
    }
}

#[async_trait]
impl ResourceHintIssuer for RecordingIssuer {
    async fn issue(&self, hint: &ResourceHint) -> Result<(), PrefetchError> {
        self.calls.lock().push(hint.clone());
        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(PrefetchError::HintFailed {
                url: hint.url.clone(),
                reason: "simulated network error".into(),
            })
        } else {
            Ok(())
        }
    }
}

/// Host whose viewport and pointer signals are driven by the test.
#[derive(Default)]
pub struct ChannelHost {
    viewport: Mutex<HashMap<ElementId, mpsc::UnboundedSender<bool>>>,
    pointer: Mutex<HashMap<ElementId, mpsc::UnboundedSender<PointerEvent>>>,
    unobserved: Mutex<Vec<ElementId>>,
}

impl ChannelHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Report an intersection change; `false` if nobody observes `element`.
    pub fn intersect(&self, element: &str, visible: bool) -> bool {
        self.viewport
            .lock()
            .get(&ElementId::from(element))
            .is_some_and(|tx| tx.send(visible).is_ok())
    }

    /// Report a pointer transition; `false` if nobody listens on `element`.
    pub fn pointer(&self, element: &str, event: PointerEvent) -> bool {
        self.pointer
            .lock()
            .get(&ElementId::from(element))
            .is_some_and(|tx| tx.send(event).is_ok())
    }

    pub fn unobserved(&self) -> Vec<ElementId> {
        self.unobserved.lock().clone()
    }
}

impl ViewportObserver for ChannelHost {
    fn observe(&self, element: &ElementId) -> Option<mpsc::UnboundedReceiver<bool>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.viewport.lock().insert(element.clone(), tx);
        Some(rx)
    }

    fn unobserve(&self, element: &ElementId) {
        self.viewport.lock().remove(element);
        self.unobserved.lock().push(element.clone());
    }
}

impl PointerEventSource for ChannelHost {
    fn pointer_events(&self, element: &ElementId) -> Option<mpsc::UnboundedReceiver<PointerEvent>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pointer.lock().insert(element.clone(), tx);
        Some(rx)
    }
}

/// Idle scheduler released by the test.
#[derive(Default)]
pub struct ManualIdle {
    notify: Arc<Notify>,
}

impl ManualIdle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn go_idle(&self) {
        self.notify.notify_waiters();
    }
}

impl IdleScheduler for ManualIdle {
    fn when_idle(&self) -> Option<IdleFuture> {
        let notify = Arc::clone(&self.notify);
        Some(Box::pin(async move { notify.notified().await }))
    }
}

/// Wait up to two seconds for an event matching `pred`.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<PrefetchEvent>, pred: F) -> PrefetchEvent
where
    F: Fn(&PrefetchEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Wait for `Loaded` of `url`.
pub async fn wait_loaded(rx: &mut broadcast::Receiver<PrefetchEvent>, url: &str) {
    wait_for(rx, |e| matches!(e, PrefetchEvent::Loaded { url: u } if u == url)).await;
}

/// Every event received within `window`.
pub async fn drain_for(rx: &mut broadcast::Receiver<PrefetchEvent>, window: Duration) -> Vec<PrefetchEvent> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + window;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(event)) => events.push(event),
            Ok(Err(RecvError::Lagged(_))) => {}
            Ok(Err(RecvError::Closed)) | Err(_) => return events,
        }
    }
}

/// Urls of `Dispatched` events, in order.
pub fn dispatched(events: &[PrefetchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PrefetchEvent::Dispatched { url, .. } => Some(url.clone()),
            _ => None,
        })
        .collect()
}
