//! Scheduling core: registry, admission, dispatch, retry and trigger bindings.

pub mod admission;
pub mod audit;
pub mod dispatcher;
pub mod entry;
pub mod error;
pub mod events;
pub mod queue;
pub mod registry;
pub mod retry;
pub mod sensors;
pub mod service;
pub mod spawn;
pub mod triggers;

pub use admission::{AdmissionDecision, AdmissionPolicy, DeferReason, SensorAdmissionPolicy};
pub use audit::{AuditEvent, AuditSink, InMemoryAuditSink, build_audit_event};
pub use dispatcher::{HintDestination, HintRel, ResourceHint, ResourceHintIssuer, ServiceWorkerRegistrar, TypeDispatcher};
pub use entry::{PrefetchConfig, ResourceEntry};
pub use error::{AppResult, PrefetchError};
pub use events::PrefetchEvent;
pub use queue::PrefetchQueue;
pub use registry::{ResourceRegistry, StatusSnapshot, SubmitOutcome};
pub use retry::{RetryDecision, RetryPolicy};
pub use sensors::{
    BatteryInfoProvider, ConnectivityProvider, EnvironmentSensors, NetworkInfoProvider, SensorChange, SensorState,
    SensorSubscriptions,
};
pub use service::PrefetchService;
pub use spawn::Spawn;
pub use triggers::{
    BindingHandle, BindingKind, BindingTable, ElementId, HeadlessHost, IdleFuture, IdleScheduler, PointerEvent,
    PointerEventSource, ViewportObserver,
};
