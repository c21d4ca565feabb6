//! The prefetch service: one explicitly constructed scheduler instance shared
//! by handle.
//!
//! Control flow: a caller or trigger binding submits `(url, kind, config)` to
//! the registry; every submission, sensor change and retry timer runs a
//! dispatch pass; the pass drains the queue in priority order, consults the
//! admission policy for each entry and either marks it `loading` and spawns
//! its hint, or puts it back. Hint outcomes settle the entry as `loaded` or
//! hand it to the retry policy.
//!
//! Registry and queue live behind a single `parking_lot::Mutex`, so an
//! admission check and the transition it allows are atomic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use super::admission::{AdmissionDecision, AdmissionPolicy};
use super::audit::{build_audit_event, AuditSink};
use super::dispatcher::{ServiceWorkerRegistrar, TypeDispatcher};
use super::events::PrefetchEvent;
use super::registry::{ResourceRegistry, StatusSnapshot, SubmitOutcome};
use super::retry::{RetryDecision, RetryPolicy};
use super::sensors::{forward_changes, EnvironmentSensors, SensorChange};
use super::triggers::{
    run_hover_binding, run_idle_binding, run_visibility_binding, BindingHandle, BindingKind, BindingTable,
    ElementId, IdleScheduler, PointerEventSource, ViewportObserver,
};
use super::{PrefetchConfig, PrefetchError, ResourceEntry, Spawn};
use crate::config::PrefetchServiceConfig;
use crate::infra::queue::InMemoryQueue;
use crate::runtime::api::{PrefetchView, StatusPoller};
use crate::runtime::TokioSpawner;
use crate::util::types::{BatteryLevel, NetworkSpeed, PrefetchStrategy, Priority, ResourceType};

/// Element and idle capabilities used by trigger bindings.
pub(crate) struct HostBindings {
    pub(crate) viewport: Arc<dyn ViewportObserver>,
    pub(crate) pointer: Arc<dyn PointerEventSource>,
    pub(crate) idle: Arc<dyn IdleScheduler>,
}

/// Everything the builder hands over to assemble a service.
pub(crate) struct ServiceParts<S> {
    pub(crate) config: PrefetchServiceConfig,
    pub(crate) sensors: EnvironmentSensors,
    pub(crate) policy: Arc<dyn AdmissionPolicy>,
    pub(crate) dispatcher: TypeDispatcher,
    pub(crate) host: HostBindings,
    pub(crate) service_worker: Arc<dyn ServiceWorkerRegistrar>,
    pub(crate) audit: Option<Arc<Mutex<dyn AuditSink>>>,
    pub(crate) spawner: S,
}

struct ServiceInner<S> {
    config: PrefetchServiceConfig,
    retry: RetryPolicy,
    registry: Mutex<ResourceRegistry<InMemoryQueue>>,
    sensors: EnvironmentSensors,
    policy: Arc<dyn AdmissionPolicy>,
    dispatcher: TypeDispatcher,
    host: HostBindings,
    service_worker: Arc<dyn ServiceWorkerRegistrar>,
    bindings: Arc<BindingTable>,
    events: broadcast::Sender<PrefetchEvent>,
    view: watch::Sender<PrefetchView>,
    audit: Option<Arc<Mutex<dyn AuditSink>>>,
    shutdown: watch::Sender<bool>,
    started: AtomicBool,
    spawner: S,
}

/// Process-wide prefetch scheduler.
///
/// Cheap to clone; clones share one scheduler. Construct it once at startup
/// with [`crate::builders::PrefetchServiceBuilder`] and pass handles to
/// consumers.
pub struct PrefetchService<S = TokioSpawner> {
    inner: Arc<ServiceInner<S>>,
}

impl<S> Clone for PrefetchService<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Resolve once `rx` reads `true` or its sender is gone.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        let stop = *rx.borrow_and_update();
        if stop || rx.changed().await.is_err() {
            return;
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl<S> PrefetchService<S>
where
    S: Spawn + Clone + Send + Sync + 'static,
{
    pub(crate) fn assemble(parts: ServiceParts<S>) -> Self {
        let initial_view = PrefetchView {
            status: StatusSnapshot::default(),
            sensors: parts.sensors.snapshot(),
        };
        let (events, _) = broadcast::channel(parts.config.event_capacity);
        let registry = ResourceRegistry::new(InMemoryQueue::new(), parts.config.max_tracked_resources);
        Self {
            inner: Arc::new(ServiceInner {
                retry: parts.config.retry_policy(),
                config: parts.config,
                registry: Mutex::new(registry),
                sensors: parts.sensors,
                policy: parts.policy,
                dispatcher: parts.dispatcher,
                host: parts.host,
                service_worker: parts.service_worker,
                bindings: Arc::new(BindingTable::default()),
                events,
                view: watch::Sender::new(initial_view),
                audit: parts.audit,
                shutdown: watch::Sender::new(false),
                started: AtomicBool::new(false),
                spawner: parts.spawner,
            }),
        }
    }

    /// Spawn sensor listeners, the status tick and service-worker
    /// registration. Calling it again is a no-op.
    ///
    /// Host sensor changes published since construction are applied first.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return;
        }
        self.apply_pending_sensor_changes();
        if let Some(subscriptions) = self.inner.sensors.take_subscriptions() {
            if let Some(rx) = subscriptions.network {
                self.spawn_listener(rx, SensorChange::Network);
            }
            if let Some(rx) = subscriptions.battery {
                self.spawn_listener(rx, SensorChange::Battery);
            }
            if let Some(rx) = subscriptions.online {
                self.spawn_listener(rx, SensorChange::Online);
            }
        }
        self.register_service_worker();
        self.spawn_status_tick();
        tracing::info!(
            sensors = ?self.inner.sensors.snapshot(),
            "prefetch service started"
        );
    }

    /// Stop listeners, the status tick, pending retry timers and every binding.
    ///
    /// Entries whose retry timer is cancelled become terminal failures, so a
    /// later reconnection or resubmission still picks them up.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        let bindings = self.inner.bindings.cancel_all();
        let abandoned = self.inner.registry.lock().abandon_pending_retries();
        for url in &abandoned {
            self.audit(url, "fail", Some("shutdown".to_string()));
            self.emit(PrefetchEvent::Failed {
                url: url.clone(),
                reason: "retry cancelled by shutdown".to_string(),
            });
        }
        tracing::info!(bindings, abandoned = abandoned.len(), "prefetch service shut down");
        self.publish_view();
    }

    /// Submit a resource for prefetching.
    ///
    /// Loaded or in-flight urls are ignored. A queued submission immediately
    /// runs a dispatch pass.
    pub fn prefetch_resource(
        &self,
        url: &str,
        kind: ResourceType,
        config: Option<PrefetchConfig>,
    ) -> SubmitOutcome {
        let config = config.unwrap_or_default();
        let outcome = self.inner.registry.lock().submit(url, kind, &config);
        match outcome {
            SubmitOutcome::Queued => {
                tracing::debug!(
                    url,
                    %kind,
                    priority = %config.priority,
                    strategy = ?config.strategy,
                    cache_policy = ?config.cache_policy,
                    timeout_ms = config.timeout.map(millis),
                    "resource queued"
                );
                self.audit(url, "submit", Some(format!("{kind}/{}", config.priority)));
                self.emit(PrefetchEvent::Queued {
                    url: url.to_string(),
                    kind,
                    priority: config.priority,
                });
                self.dispatch_pending();
            }
            SubmitOutcome::AlreadyLoaded | SubmitOutcome::AlreadyActive => {
                tracing::trace!(url, ?outcome, "duplicate submission ignored");
            }
        }
        outcome
    }

    /// Prefetch `url` the first time `element` intersects the viewport.
    ///
    /// Without a viewport observer the resource is submitted right away.
    pub fn setup_intersection_observer(
        &self,
        element: ElementId,
        url: impl Into<String>,
        kind: ResourceType,
    ) -> BindingHandle {
        let url = url.into();
        let (id, cancel) = self.inner.bindings.register();
        let handle = BindingHandle::new(id, BindingKind::Visible, &self.inner.bindings);
        let config = PrefetchConfig::with_priority(Priority::Low).strategy(PrefetchStrategy::Visible);

        let Some(intersections) = self.inner.host.viewport.observe(&element) else {
            tracing::info!(%element, url = %url, "visibility observation unavailable, prefetching now");
            self.inner.bindings.release(&id);
            self.prefetch_resource(&url, kind, Some(config));
            return handle;
        };

        let this = self.clone();
        self.inner.spawner.spawn(async move {
            let submitter = this.clone();
            let target = url.clone();
            let fired = run_visibility_binding(intersections, cancel, move || {
                submitter.prefetch_resource(&target, kind, Some(config));
            })
            .await;
            this.inner.host.viewport.unobserve(&element);
            this.inner.bindings.release(&id);
            tracing::debug!(%element, url = %url, fired, "visibility binding finished");
        });
        handle
    }

    /// Prefetch `url` when the pointer rests on `element` for the hover delay.
    ///
    /// Without a pointer source the binding is inert.
    pub fn setup_hover_prefetch(
        &self,
        element: ElementId,
        url: impl Into<String>,
        kind: ResourceType,
    ) -> BindingHandle {
        let url = url.into();
        let (id, cancel) = self.inner.bindings.register();
        let handle = BindingHandle::new(id, BindingKind::Hover, &self.inner.bindings);

        let Some(events) = self.inner.host.pointer.pointer_events(&element) else {
            tracing::info!(%element, url = %url, "pointer events unavailable, hover binding inert");
            self.inner.bindings.release(&id);
            return handle;
        };

        let this = self.clone();
        let delay = self.inner.config.hover_delay();
        self.inner.spawner.spawn(async move {
            let submitter = this.clone();
            let target = url.clone();
            let config = PrefetchConfig::with_priority(Priority::Medium).strategy(PrefetchStrategy::Hover);
            run_hover_binding(events, cancel, delay, move || {
                submitter.prefetch_resource(&target, kind, Some(config.clone()));
            })
            .await;
            this.inner.bindings.release(&id);
            tracing::debug!(%element, url = %url, "hover binding finished");
        });
        handle
    }

    /// Prefetch `url` when the host reports idle time, or right away if the
    /// host has no notion of idleness.
    pub fn prefetch_when_idle(
        &self,
        url: impl Into<String>,
        kind: ResourceType,
        config: Option<PrefetchConfig>,
    ) -> BindingHandle {
        let url = url.into();
        let config = config
            .unwrap_or_else(|| PrefetchConfig::with_priority(Priority::Low))
            .strategy(PrefetchStrategy::NetworkIdle);
        let (id, cancel) = self.inner.bindings.register();
        let handle = BindingHandle::new(id, BindingKind::Idle, &self.inner.bindings);

        let Some(idle) = self.inner.host.idle.when_idle() else {
            self.inner.bindings.release(&id);
            self.prefetch_resource(&url, kind, Some(config));
            return handle;
        };

        let this = self.clone();
        self.inner.spawner.spawn(async move {
            let submitter = this.clone();
            run_idle_binding(idle, cancel, move || {
                submitter.prefetch_resource(&url, kind, Some(config));
            })
            .await;
            this.inner.bindings.release(&id);
        });
        handle
    }

    /// Drop every pending entry. Loaded, loading and failed bookkeeping is kept.
    pub fn clear_prefetch_queue(&self) -> usize {
        let removed = self.inner.registry.lock().clear_queue();
        tracing::info!(removed, "prefetch queue cleared");
        self.emit(PrefetchEvent::Cleared { all: false });
        self.publish_view();
        removed
    }

    /// Forget every tracked resource and tear down all bindings.
    ///
    /// Hints already in flight still run; their outcomes are ignored.
    pub fn clear_all_resources(&self) {
        self.inner.registry.lock().clear_all();
        let bindings = self.inner.bindings.cancel_all();
        tracing::info!(bindings, "all prefetch resources cleared");
        self.emit(PrefetchEvent::Cleared { all: true });
        self.publish_view();
    }

    /// Counters over every tracked resource.
    pub fn status(&self) -> StatusSnapshot {
        self.inner.registry.lock().snapshot()
    }

    /// Tracked entry for `url`.
    pub fn resource(&self, url: &str) -> Option<ResourceEntry> {
        self.inner.registry.lock().get(url).cloned()
    }

    /// Whether `url` exhausted its retries and waits for connectivity.
    pub fn is_terminal_failed(&self, url: &str) -> bool {
        self.inner.registry.lock().is_terminal_failed(url)
    }

    /// Current network classification.
    pub fn network_speed(&self) -> NetworkSpeed {
        self.inner.sensors.network_speed()
    }

    /// Current battery classification.
    pub fn battery_level(&self) -> BatteryLevel {
        self.inner.sensors.battery_level()
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.inner.sensors.is_online()
    }

    /// Override the network classification.
    pub fn set_network_speed(&self, speed: NetworkSpeed) -> bool {
        self.apply_sensor_change(SensorChange::Network(speed))
    }

    /// Override the battery classification.
    pub fn set_battery_level(&self, level: BatteryLevel) -> bool {
        self.apply_sensor_change(SensorChange::Battery(level))
    }

    /// Override connectivity. Going online resubmits terminal failures.
    pub fn set_online(&self, online: bool) -> bool {
        self.apply_sensor_change(SensorChange::Online(online))
    }

    /// Events for every state transition.
    pub fn subscribe(&self) -> broadcast::Receiver<PrefetchEvent> {
        self.inner.events.subscribe()
    }

    /// Reactive status binding.
    pub fn poller(&self) -> StatusPoller {
        StatusPoller::new(self.inner.view.subscribe())
    }

    /// Number of live trigger bindings.
    pub fn active_bindings(&self) -> usize {
        self.inner.bindings.len()
    }

    /// Apply a sensor update and react to it: a change re-runs dispatch, and
    /// an offline to online transition first resubmits terminal failures.
    /// Returns whether anything changed.
    pub fn apply_sensor_change(&self, change: SensorChange) -> bool {
        let Some(previous) = self.inner.sensors.apply(change) else {
            return false;
        };
        let current = self.inner.sensors.snapshot();
        tracing::info!(?change, "sensor state changed");
        self.emit(PrefetchEvent::SensorsChanged(current));
        if !previous.is_online && current.is_online {
            self.reconnect_sweep();
        }
        self.dispatch_pending();
        self.publish_view();
        true
    }

    /// Catch up on host changes no listener has forwarded yet.
    fn apply_pending_sensor_changes(&self) {
        for change in self.inner.sensors.pending_changes() {
            self.apply_sensor_change(change);
        }
    }

    fn reconnect_sweep(&self) {
        let urls = self.inner.registry.lock().resubmit_terminal_failed();
        if !urls.is_empty() {
            tracing::info!(count = urls.len(), "connectivity restored, resubmitting failed resources");
        }
        for url in urls {
            self.audit(&url, "resubmit", None);
            self.emit(PrefetchEvent::Resubmitted { url });
        }
    }

    /// Run one dispatch pass: drain the queue in priority order, start every
    /// admitted entry and put deferred ones back. Returns how many started.
    ///
    /// Before [`Self::start`], host sensor changes are picked up here so
    /// admission never runs on stale readings.
    pub fn dispatch_pending(&self) -> usize {
        if !self.inner.started.load(Ordering::Acquire) {
            self.apply_pending_sensor_changes();
        }
        let sensors = self.inner.sensors.snapshot();
        let mut admitted = Vec::new();
        let mut deferred = Vec::new();
        {
            let mut registry = self.inner.registry.lock();
            let mut held = Vec::new();
            while let Some(entry) = registry.dequeue() {
                let current = registry.status_of(&entry.url);
                match self.inner.policy.evaluate(&entry, &sensors, current) {
                    AdmissionDecision::Admit if registry.is_queued(&entry.url, entry.seq) => {
                        registry.mark_loading(&entry.url);
                        admitted.push(entry);
                    }
                    AdmissionDecision::Defer(reason) if registry.is_queued(&entry.url, entry.seq) => {
                        deferred.push((entry.url.clone(), reason));
                        held.push(entry);
                    }
                    decision => {
                        tracing::trace!(url = %entry.url, ?decision, "dropping stale queue entry");
                    }
                }
            }
            for entry in held {
                registry.requeue(entry);
            }
        }

        for (url, reason) in &deferred {
            tracing::debug!(url = %url, ?reason, "prefetch deferred");
            self.audit(url, "defer", Some(format!("{reason:?}")));
            self.emit(PrefetchEvent::Deferred {
                url: url.clone(),
                reason: *reason,
            });
        }

        let started = admitted.len();
        for entry in admitted {
            tracing::debug!(url = %entry.url, kind = %entry.kind, attempt = entry.retry_count, "dispatching prefetch");
            self.audit(&entry.url, "dispatch", None);
            self.emit(PrefetchEvent::Dispatched {
                url: entry.url.clone(),
                kind: entry.kind,
                attempt: entry.retry_count,
            });
            self.spawn_execution(entry);
        }
        if started > 0 || !deferred.is_empty() {
            self.publish_view();
        }
        started
    }

    fn spawn_execution(&self, entry: ResourceEntry) {
        let this = self.clone();
        self.inner.spawner.spawn(async move {
            let outcome = this.inner.dispatcher.execute(&entry).await;
            this.settle(&entry, outcome);
        });
    }

    fn settle(&self, entry: &ResourceEntry, outcome: Result<(), PrefetchError>) {
        match outcome {
            Ok(()) => {
                let loaded = {
                    let mut registry = self.inner.registry.lock();
                    registry.is_current(&entry.url, entry.seq) && registry.mark_loaded(&entry.url)
                };
                if loaded {
                    tracing::debug!(url = %entry.url, "prefetch loaded");
                    self.audit(&entry.url, "load", None);
                    self.emit(PrefetchEvent::Loaded { url: entry.url.clone() });
                }
            }
            Err(err) => self.handle_failure(entry, &err),
        }
        self.publish_view();
    }

    fn handle_failure(&self, entry: &ResourceEntry, err: &PrefetchError) {
        let decision = {
            let mut registry = self.inner.registry.lock();
            if !registry.is_current(&entry.url, entry.seq) {
                return;
            }
            let Some(retry_count) = registry.mark_failed(&entry.url) else {
                return;
            };
            let decision = if *self.inner.shutdown.borrow() {
                RetryDecision::GiveUp
            } else {
                self.inner.retry.on_failure(retry_count)
            };
            match decision {
                RetryDecision::Retry { .. } => {
                    registry.increment_retry(&entry.url);
                }
                RetryDecision::GiveUp => registry.mark_terminal(&entry.url),
            }
            decision
        };

        match decision {
            RetryDecision::Retry { attempt, delay } => {
                tracing::warn!(
                    url = %entry.url,
                    attempt,
                    delay_ms = millis(delay),
                    error = %err,
                    "prefetch failed, retrying"
                );
                self.audit(&entry.url, "retry", Some(err.to_string()));
                self.emit(PrefetchEvent::RetryScheduled {
                    url: entry.url.clone(),
                    attempt,
                    delay,
                });
                self.schedule_retry(entry.url.clone(), entry.seq, attempt, delay);
            }
            RetryDecision::GiveUp => {
                tracing::warn!(
                    url = %entry.url,
                    retries = entry.retry_count,
                    error = %err,
                    "prefetch failed permanently"
                );
                self.audit(&entry.url, "fail", Some(err.to_string()));
                self.emit(PrefetchEvent::Failed {
                    url: entry.url.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    fn schedule_retry(&self, url: String, seq: u64, attempt: u32, delay: Duration) {
        let this = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        self.inner.spawner.spawn(async move {
            tokio::select! {
                biased;
                () = wait_for_shutdown(&mut shutdown) => return,
                () = tokio::time::sleep(delay) => {}
            }
            let requeued = this.inner.registry.lock().requeue_retry(&url, seq);
            if requeued {
                tracing::debug!(url = %url, attempt, "retry requeued");
                this.dispatch_pending();
            }
        });
    }

    fn spawn_listener<T>(&self, rx: watch::Receiver<T>, to_change: fn(T) -> SensorChange)
    where
        T: Copy + Send + Sync + 'static,
    {
        let this = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        self.inner.spawner.spawn(async move {
            tokio::select! {
                biased;
                () = wait_for_shutdown(&mut shutdown) => {}
                () = forward_changes(rx, move |value| {
                    this.apply_sensor_change(to_change(value));
                }) => {}
            }
        });
    }

    fn spawn_status_tick(&self) {
        let this = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        let period = self.inner.config.status_interval();
        self.inner.spawner.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    biased;
                    () = wait_for_shutdown(&mut shutdown) => break,
                    _ = ticker.tick() => this.publish_view(),
                }
            }
        });
    }

    fn register_service_worker(&self) {
        let Some(script) = self.inner.config.service_worker_script.clone() else {
            return;
        };
        let registrar = Arc::clone(&self.inner.service_worker);
        self.inner.spawner.spawn(async move {
            match registrar.register(&script).await {
                Ok(()) => tracing::info!(script = %script, "service worker registered"),
                Err(e) => tracing::info!(script = %script, error = %e, "service worker registration skipped"),
            }
        });
    }

    fn publish_view(&self) {
        let view = PrefetchView {
            status: self.status(),
            sensors: self.inner.sensors.snapshot(),
        };
        self.inner.view.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn emit(&self, event: PrefetchEvent) {
        // No receivers is fine
        let _ = self.inner.events.send(event);
    }

    fn audit(&self, url: &str, action: &str, detail: Option<String>) {
        if let Some(sink) = &self.inner.audit {
            sink.lock().record(build_audit_event(url, action, detail));
        }
    }
}
