//! Default host adapters for hint issuing and service-worker registration.

use async_trait::async_trait;

use crate::core::dispatcher::{ResourceHint, ResourceHintIssuer, ServiceWorkerRegistrar};
use crate::core::PrefetchError;

/// Issuer for hosts with no fetch-hint primitive: records the hint in the
/// log and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHintIssuer;

#[async_trait]
impl ResourceHintIssuer for LoggingHintIssuer {
    async fn issue(&self, hint: &ResourceHint) -> Result<(), PrefetchError> {
        tracing::debug!(
            url = %hint.url,
            rel = hint.rel.as_str(),
            destination = hint.destination.map(|d| d.as_str()),
            cross_origin = hint.cross_origin,
            mime_type = hint.mime_type,
            "resource hint (no host fetch primitive)"
        );
        Ok(())
    }
}

/// Registrar for hosts without background service support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServiceWorker;

#[async_trait]
impl ServiceWorkerRegistrar for NoServiceWorker {
    async fn register(&self, _script_url: &str) -> Result<(), PrefetchError> {
        Err(PrefetchError::ServiceWorker("service workers unsupported".into()))
    }
}
