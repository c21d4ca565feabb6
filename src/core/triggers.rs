//! Trigger bindings: adapters that turn visibility, hover intent and idle time
//! into submissions.
//!
//! Each binding runs as its own task and owns a cancellation slot in a
//! [`BindingTable`]. Disposing a [`BindingHandle`] tears down that one binding
//! without touching scheduler state.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Opaque identifier of a host element (DOM node, widget, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pointer transitions over an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Pointer entered the element.
    Enter,
    /// Pointer left the element.
    Leave,
}

/// Kind of trigger a binding was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    /// First viewport intersection.
    Visible,
    /// Debounced hover intent.
    Hover,
    /// Host idle time.
    Idle,
}

/// Host capability reporting element/viewport intersection.
pub trait ViewportObserver: Send + Sync {
    /// Start observing `element`. Each message is the current intersection
    /// state. `None` means the host cannot observe visibility.
    fn observe(&self, element: &ElementId) -> Option<mpsc::UnboundedReceiver<bool>>;

    /// Stop observing `element`.
    fn unobserve(&self, _element: &ElementId) {}
}

/// Host capability reporting pointer enter/leave on elements.
pub trait PointerEventSource: Send + Sync {
    /// Pointer events for `element`, or `None` if the host has no pointer.
    fn pointer_events(&self, element: &ElementId) -> Option<mpsc::UnboundedReceiver<PointerEvent>>;
}

/// Future resolving when the host has spare cycles.
pub type IdleFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Host capability signalling idle time.
pub trait IdleScheduler: Send + Sync {
    /// A future that resolves at the next idle period, or `None` if the host
    /// has no notion of idleness.
    fn when_idle(&self) -> Option<IdleFuture>;
}

/// Host without any element or idle capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

impl ViewportObserver for HeadlessHost {
    fn observe(&self, _element: &ElementId) -> Option<mpsc::UnboundedReceiver<bool>> {
        None
    }
}

impl PointerEventSource for HeadlessHost {
    fn pointer_events(&self, _element: &ElementId) -> Option<mpsc::UnboundedReceiver<PointerEvent>> {
        None
    }
}

impl IdleScheduler for HeadlessHost {
    fn when_idle(&self) -> Option<IdleFuture> {
        None
    }
}

/// Cancellation slots of live bindings.
#[derive(Default)]
pub struct BindingTable {
    slots: Mutex<HashMap<Uuid, oneshot::Sender<()>>>,
}

impl BindingTable {
    /// Allocate a slot; the receiver resolves when the binding is cancelled.
    pub(crate) fn register(&self) -> (Uuid, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        self.slots.lock().insert(id, tx);
        (id, rx)
    }

    /// Drop the slot of a binding that finished on its own.
    pub(crate) fn release(&self, id: &Uuid) {
        self.slots.lock().remove(id);
    }

    /// Cancel one binding.
    pub fn cancel(&self, id: &Uuid) -> bool {
        let slot = self.slots.lock().remove(id);
        slot.is_some_and(|tx| {
            let _ = tx.send(());
            true
        })
    }

    /// Cancel every binding. Returns how many were live.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.slots.lock().drain().collect();
        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(());
        }
        count
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no binding is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn contains(&self, id: &Uuid) -> bool {
        self.slots.lock().contains_key(id)
    }
}

/// Handle to a live binding.
///
/// Dropping the handle leaves the binding running; call
/// [`BindingHandle::dispose`] to tear it down.
#[derive(Debug, Clone)]
pub struct BindingHandle {
    id: Uuid,
    kind: BindingKind,
    table: Weak<BindingTable>,
}

impl BindingHandle {
    pub(crate) fn new(id: Uuid, kind: BindingKind, table: &Arc<BindingTable>) -> Self {
        Self {
            id,
            kind,
            table: Arc::downgrade(table),
        }
    }

    /// Binding identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Trigger kind.
    #[must_use]
    pub const fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Whether the binding is still waiting on its trigger.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.table.upgrade().is_some_and(|t| t.contains(&self.id))
    }

    /// Tear the binding down. Returns `false` if it had already finished.
    pub fn dispose(self) -> bool {
        self.table.upgrade().is_some_and(|t| t.cancel(&self.id))
    }
}

/// Wait for the first intersection, then call `on_visible` once.
///
/// Returns `true` if the callback ran.
pub(crate) async fn run_visibility_binding<F>(
    mut intersections: mpsc::UnboundedReceiver<bool>,
    mut cancel: oneshot::Receiver<()>,
    on_visible: F,
) -> bool
where
    F: FnOnce() + Send,
{
    loop {
        tokio::select! {
            _ = &mut cancel => return false,
            next = intersections.recv() => match next {
                Some(true) => {
                    on_visible();
                    return true;
                }
                Some(false) => {}
                None => return false,
            },
        }
    }
}

/// Call `on_intent` whenever the pointer rests on the element for `delay`.
/// A `Leave` before the delay elapses cancels the pending call.
pub(crate) async fn run_hover_binding<F>(
    mut events: mpsc::UnboundedReceiver<PointerEvent>,
    mut cancel: oneshot::Receiver<()>,
    delay: Duration,
    mut on_intent: F,
) where
    F: FnMut() + Send,
{
    let mut hovering = false;
    loop {
        if hovering {
            let timer = tokio::time::sleep(delay);
            tokio::pin!(timer);
            // Debounce window: leave cancels, repeated enters are ignored
            loop {
                tokio::select! {
                    _ = &mut cancel => return,
                    () = &mut timer => {
                        on_intent();
                        hovering = false;
                        break;
                    }
                    next = events.recv() => match next {
                        Some(PointerEvent::Leave) => {
                            hovering = false;
                            break;
                        }
                        Some(PointerEvent::Enter) => {}
                        None => return,
                    },
                }
            }
        } else {
            tokio::select! {
                _ = &mut cancel => return,
                next = events.recv() => match next {
                    Some(PointerEvent::Enter) => hovering = true,
                    Some(PointerEvent::Leave) => {}
                    None => return,
                },
            }
        }
    }
}

/// Call `on_idle` once `idle` resolves. Returns `true` if the callback ran.
pub(crate) async fn run_idle_binding<F>(idle: IdleFuture, mut cancel: oneshot::Receiver<()>, on_idle: F) -> bool
where
    F: FnOnce() + Send,
{
    tokio::select! {
        _ = &mut cancel => false,
        () = idle => {
            on_idle();
            true
        }
    }
}
