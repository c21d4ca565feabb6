//! Builder wiring host capabilities into a [`PrefetchService`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::PrefetchServiceConfig;
use crate::core::admission::{AdmissionPolicy, SensorAdmissionPolicy};
use crate::core::audit::AuditSink;
use crate::core::dispatcher::{ResourceHintIssuer, ServiceWorkerRegistrar, TypeDispatcher};
use crate::core::sensors::{BatteryInfoProvider, ConnectivityProvider, EnvironmentSensors, NetworkInfoProvider};
use crate::core::service::{HostBindings, ServiceParts};
use crate::core::triggers::{HeadlessHost, IdleScheduler, PointerEventSource, ViewportObserver};
use crate::core::{PrefetchError, PrefetchService, Spawn};
use crate::infra::environment::PermissiveEnvironment;
use crate::infra::hints::{LoggingHintIssuer, NoServiceWorker};
use crate::runtime::TokioSpawner;

/// Assembles a [`PrefetchService`].
///
/// Every capability defaults to the permissive stand-in: sensors report fast,
/// charged and online; hints are only logged; bindings fire immediately (or,
/// for hover, never); service-worker registration is skipped.
pub struct PrefetchServiceBuilder {
    config: PrefetchServiceConfig,
    network: Arc<dyn NetworkInfoProvider>,
    battery: Arc<dyn BatteryInfoProvider>,
    connectivity: Arc<dyn ConnectivityProvider>,
    issuer: Arc<dyn ResourceHintIssuer>,
    policy: Arc<dyn AdmissionPolicy>,
    viewport: Arc<dyn ViewportObserver>,
    pointer: Arc<dyn PointerEventSource>,
    idle: Arc<dyn IdleScheduler>,
    service_worker: Arc<dyn ServiceWorkerRegistrar>,
    audit: Option<Arc<Mutex<dyn AuditSink>>>,
}

impl Default for PrefetchServiceBuilder {
    fn default() -> Self {
        Self::new(PrefetchServiceConfig::default())
    }
}

impl PrefetchServiceBuilder {
    /// Builder over `config` with permissive capabilities.
    #[must_use]
    pub fn new(config: PrefetchServiceConfig) -> Self {
        let env = Arc::new(PermissiveEnvironment);
        let host = Arc::new(HeadlessHost);
        Self {
            config,
            network: env.clone(),
            battery: env.clone(),
            connectivity: env,
            issuer: Arc::new(LoggingHintIssuer),
            policy: Arc::new(SensorAdmissionPolicy),
            viewport: host.clone(),
            pointer: host.clone(),
            idle: host,
            service_worker: Arc::new(NoServiceWorker),
            audit: None,
        }
    }

    /// Configuration the service will be built with.
    #[must_use]
    pub const fn config(&self) -> &PrefetchServiceConfig {
        &self.config
    }

    /// Use one provider for all three sensors.
    #[must_use]
    pub fn with_environment<E>(mut self, env: Arc<E>) -> Self
    where
        E: NetworkInfoProvider + BatteryInfoProvider + ConnectivityProvider + 'static,
    {
        self.network = env.clone();
        self.battery = env.clone();
        self.connectivity = env;
        self
    }

    /// Network information provider.
    #[must_use]
    pub fn with_network_info(mut self, provider: Arc<dyn NetworkInfoProvider>) -> Self {
        self.network = provider;
        self
    }

    /// Battery provider.
    #[must_use]
    pub fn with_battery_info(mut self, provider: Arc<dyn BatteryInfoProvider>) -> Self {
        self.battery = provider;
        self
    }

    /// Connectivity provider.
    #[must_use]
    pub fn with_connectivity(mut self, provider: Arc<dyn ConnectivityProvider>) -> Self {
        self.connectivity = provider;
        self
    }

    /// Host fetch-hint primitive.
    #[must_use]
    pub fn with_hint_issuer(mut self, issuer: Arc<dyn ResourceHintIssuer>) -> Self {
        self.issuer = issuer;
        self
    }

    /// Replace the sensor-based admission policy.
    #[must_use]
    pub fn with_admission_policy(mut self, policy: Arc<dyn AdmissionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Viewport intersection capability.
    #[must_use]
    pub fn with_viewport_observer(mut self, observer: Arc<dyn ViewportObserver>) -> Self {
        self.viewport = observer;
        self
    }

    /// Pointer event capability.
    #[must_use]
    pub fn with_pointer_events(mut self, source: Arc<dyn PointerEventSource>) -> Self {
        self.pointer = source;
        self
    }

    /// Idle-time capability.
    #[must_use]
    pub fn with_idle_scheduler(mut self, idle: Arc<dyn IdleScheduler>) -> Self {
        self.idle = idle;
        self
    }

    /// Background service registration capability.
    #[must_use]
    pub fn with_service_worker(mut self, registrar: Arc<dyn ServiceWorkerRegistrar>) -> Self {
        self.service_worker = registrar;
        self
    }

    /// Record submissions, dispatches and outcomes in `sink`.
    #[must_use]
    pub fn with_audit(mut self, sink: Arc<Mutex<dyn AuditSink>>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Build on the current tokio runtime.
    pub fn build(self) -> Result<PrefetchService<TokioSpawner>, PrefetchError> {
        let spawner = TokioSpawner::current()?;
        self.build_with_spawner(spawner)
    }

    /// Build with an explicit spawner.
    pub fn build_with_spawner<S>(self, spawner: S) -> Result<PrefetchService<S>, PrefetchError>
    where
        S: Spawn + Clone + Send + Sync + 'static,
    {
        self.config
            .validate()
            .map_err(|e| PrefetchError::InvalidConfig(format!("config invalid: {e}")))?;

        let sensors = EnvironmentSensors::new(self.network, self.battery, self.connectivity);
        Ok(PrefetchService::assemble(ServiceParts {
            config: self.config,
            sensors,
            policy: self.policy,
            dispatcher: TypeDispatcher::new(self.issuer),
            host: HostBindings {
                viewport: self.viewport,
                pointer: self.pointer,
                idle: self.idle,
            },
            service_worker: self.service_worker,
            audit: self.audit,
            spawner,
        }))
    }
}
