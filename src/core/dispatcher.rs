//! Type dispatcher: turns an entry into a kind-appropriate fetch hint and hands
//! it to the host.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{PrefetchError, ResourceEntry};
use crate::util::types::ResourceType;

/// Link relation of a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintRel {
    /// Low priority fetch for a future navigation.
    Prefetch,
    /// Fetch for the current page.
    Preload,
    /// Fetch and compile an ES module.
    ModulePreload,
}

impl HintRel {
    /// Attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prefetch => "prefetch",
            Self::Preload => "preload",
            Self::ModulePreload => "modulepreload",
        }
    }
}

/// Request destination of a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintDestination {
    /// A document.
    Document,
    /// A script.
    Script,
    /// A stylesheet.
    Style,
    /// An image.
    Image,
    /// A font.
    Font,
    /// A fetch/XHR payload.
    Fetch,
}

impl HintDestination {
    /// Attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Script => "script",
            Self::Style => "style",
            Self::Image => "image",
            Self::Font => "font",
            Self::Fetch => "fetch",
        }
    }
}

/// Everything a host needs to start fetching a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHint {
    /// Resource to fetch.
    pub url: String,
    /// Kind the hint was built for.
    pub kind: ResourceType,
    /// Link relation.
    pub rel: HintRel,
    /// Request destination; `None` for generic hints.
    pub destination: Option<HintDestination>,
    /// Cross-origin mode, e.g. `anonymous`.
    pub cross_origin: Option<&'static str>,
    /// MIME type annotation.
    pub mime_type: Option<&'static str>,
}

impl ResourceHint {
    /// Build the hint for `url` as a resource of `kind`.
    #[must_use]
    pub fn for_kind(url: impl Into<String>, kind: ResourceType) -> Self {
        let (rel, destination, cross_origin, mime_type) = match kind {
            ResourceType::Page => (HintRel::Prefetch, Some(HintDestination::Document), None, None),
            ResourceType::Component => (HintRel::ModulePreload, Some(HintDestination::Script), None, None),
            ResourceType::Image => (HintRel::Preload, Some(HintDestination::Image), None, None),
            ResourceType::Font => (
                HintRel::Preload,
                Some(HintDestination::Font),
                Some("anonymous"),
                Some("font/woff2"),
            ),
            ResourceType::Script => (HintRel::Preload, Some(HintDestination::Script), None, None),
            ResourceType::Style => (HintRel::Preload, Some(HintDestination::Style), None, None),
            ResourceType::Api | ResourceType::Data => {
                (HintRel::Prefetch, Some(HintDestination::Fetch), Some("anonymous"), None)
            }
            ResourceType::Generic => (HintRel::Prefetch, None, None, None),
        };
        Self {
            url: url.into(),
            kind,
            rel,
            destination,
            cross_origin,
            mime_type,
        }
    }
}

/// Host capability that turns hints into network activity.
///
/// Implementations must be stateless per call and safe to invoke
/// concurrently for different urls. Returning `Ok` means the host finished
/// (or accepted) the fetch; any `Err` counts as a failed attempt.
#[async_trait]
pub trait ResourceHintIssuer: Send + Sync {
    /// Issue `hint` and wait for the host to settle it.
    async fn issue(&self, hint: &ResourceHint) -> Result<(), PrefetchError>;
}

/// Host capability for registering a background service (service worker).
///
/// Registration is fire-and-forget; a failure is logged and otherwise ignored.
#[async_trait]
pub trait ServiceWorkerRegistrar: Send + Sync {
    /// Register the service script at `script_url`.
    async fn register(&self, script_url: &str) -> Result<(), PrefetchError>;
}

/// Routes entries to the hint issuer with the shape their kind requires.
#[derive(Clone)]
pub struct TypeDispatcher {
    issuer: Arc<dyn ResourceHintIssuer>,
}

impl TypeDispatcher {
    /// Dispatcher over `issuer`.
    pub fn new(issuer: Arc<dyn ResourceHintIssuer>) -> Self {
        Self { issuer }
    }

    /// Issue the hint for `entry` and await the outcome.
    pub async fn execute(&self, entry: &ResourceEntry) -> Result<(), PrefetchError> {
        let hint = ResourceHint::for_kind(entry.url.clone(), entry.kind);
        tracing::debug!(
            url = %hint.url,
            kind = %hint.kind,
            rel = hint.rel.as_str(),
            "issuing resource hint"
        );
        self.issuer.issue(&hint).await
    }
}
