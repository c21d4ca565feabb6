//! Integration tests for visibility, hover and idle trigger bindings.

mod support;

use std::sync::Arc;
use std::time::Duration;

use resource_prefetch::builders::PrefetchServiceBuilder;
use resource_prefetch::config::PrefetchServiceConfig;
use resource_prefetch::core::{BindingKind, ElementId, PointerEvent, PrefetchEvent, PrefetchService};
use resource_prefetch::runtime::TokioSpawner;
use resource_prefetch::util::{Priority, ResourceType};

use support::{drain_for, wait_for, ChannelHost, ManualIdle, RecordingIssuer};

fn config() -> PrefetchServiceConfig {
    PrefetchServiceConfig::new()
        .with_hover_delay(Duration::from_millis(30))
        .with_service_worker_script(None)
}

fn hosted(host: &Arc<ChannelHost>, idle: &Arc<ManualIdle>) -> PrefetchService<TokioSpawner> {
    PrefetchServiceBuilder::new(config())
        .with_hint_issuer(RecordingIssuer::succeeding())
        .with_viewport_observer(host.clone())
        .with_pointer_events(host.clone())
        .with_idle_scheduler(idle.clone())
        .build()
        .unwrap()
}

fn headless() -> PrefetchService<TokioSpawner> {
    PrefetchServiceBuilder::new(config())
        .with_hint_issuer(RecordingIssuer::succeeding())
        .build()
        .unwrap()
}

fn queued_urls(events: &[PrefetchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            PrefetchEvent::Queued { url, .. } => Some(url.clone()),
            _ => None,
        })
        .collect()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test]
async fn test_visibility_fires_once_at_low_priority() {
    let host = ChannelHost::new();
    let service = hosted(&host, &ManualIdle::new());
    let mut events = service.subscribe();

    let handle = service.setup_intersection_observer(ElementId::from("card-1"), "/courses/1", ResourceType::Page);
    assert_eq!(handle.kind(), BindingKind::Visible);
    assert!(handle.is_active());
    settle().await;

    assert!(host.intersect("card-1", false));
    assert!(drain_for(&mut events, Duration::from_millis(20)).await.is_empty());

    assert!(host.intersect("card-1", true));
    let queued = wait_for(&mut events, |e| matches!(e, PrefetchEvent::Queued { .. })).await;
    assert_eq!(
        queued,
        PrefetchEvent::Queued {
            url: "/courses/1".into(),
            kind: ResourceType::Page,
            priority: Priority::Low,
        }
    );
    settle().await;

    assert!(!handle.is_active());
    assert_eq!(host.unobserved(), vec![ElementId::from("card-1")]);
    assert!(!host.intersect("card-1", true));
    assert_eq!(service.active_bindings(), 0);
}

#[tokio::test]
async fn test_visibility_without_observer_submits_immediately() {
    let service = headless();
    let handle = service.setup_intersection_observer(ElementId::from("card-1"), "/courses/1", ResourceType::Page);

    assert!(!handle.is_active());
    assert_eq!(service.status().total, 1);
}

#[tokio::test]
async fn test_hover_is_debounced() {
    let host = ChannelHost::new();
    let service = hosted(&host, &ManualIdle::new());
    let mut events = service.subscribe();

    let handle = service.setup_hover_prefetch(ElementId::from("nav-courses"), "/courses", ResourceType::Page);
    settle().await;

    host.pointer("nav-courses", PointerEvent::Enter);
    tokio::time::sleep(Duration::from_millis(5)).await;
    host.pointer("nav-courses", PointerEvent::Leave);
    assert!(queued_urls(&drain_for(&mut events, Duration::from_millis(60)).await).is_empty());

    host.pointer("nav-courses", PointerEvent::Enter);
    let queued = wait_for(&mut events, |e| matches!(e, PrefetchEvent::Queued { .. })).await;
    assert!(matches!(
        queued,
        PrefetchEvent::Queued { priority: Priority::Medium, ref url, .. } if url == "/courses"
    ));

    // Hover bindings keep listening after firing
    assert!(handle.is_active());
    assert!(handle.dispose());
    assert_eq!(service.active_bindings(), 0);
}

#[tokio::test]
async fn test_disposed_hover_never_fires() {
    let host = ChannelHost::new();
    let service = hosted(&host, &ManualIdle::new());
    let mut events = service.subscribe();

    let handle = service.setup_hover_prefetch(ElementId::from("nav"), "/courses", ResourceType::Page);
    settle().await;
    assert!(handle.clone().dispose());
    settle().await;

    host.pointer("nav", PointerEvent::Enter);
    assert!(queued_urls(&drain_for(&mut events, Duration::from_millis(60)).await).is_empty());
    assert!(!handle.dispose());
    assert_eq!(service.status().total, 0);
}

#[tokio::test]
async fn test_hover_without_pointer_is_inert() {
    let service = headless();
    let handle = service.setup_hover_prefetch(ElementId::from("nav"), "/courses", ResourceType::Page);

    assert!(!handle.is_active());
    settle().await;
    assert_eq!(service.status().total, 0);
}

#[tokio::test]
async fn test_idle_prefetch_waits_for_idle() {
    let idle = ManualIdle::new();
    let service = hosted(&ChannelHost::new(), &idle);
    let mut events = service.subscribe();

    let handle = service.prefetch_when_idle("/data/catalog.json", ResourceType::Data, None);
    assert_eq!(handle.kind(), BindingKind::Idle);
    settle().await;
    assert_eq!(service.status().total, 0);

    idle.go_idle();
    let queued = wait_for(&mut events, |e| matches!(e, PrefetchEvent::Queued { .. })).await;
    assert!(matches!(queued, PrefetchEvent::Queued { priority: Priority::Low, .. }));
    settle().await;
    assert!(!handle.is_active());
}

#[tokio::test]
async fn test_idle_without_scheduler_submits_immediately() {
    let service = headless();
    let handle = service.prefetch_when_idle("/data/catalog.json", ResourceType::Data, None);

    assert!(!handle.is_active());
    assert_eq!(service.status().total, 1);
}

#[tokio::test]
async fn test_clear_all_cancels_bindings() {
    let host = ChannelHost::new();
    let idle = ManualIdle::new();
    let service = hosted(&host, &idle);
    let mut events = service.subscribe();

    let visible = service.setup_intersection_observer(ElementId::from("card"), "/a", ResourceType::Page);
    let hover = service.setup_hover_prefetch(ElementId::from("nav"), "/b", ResourceType::Page);
    let idle_handle = service.prefetch_when_idle("/c", ResourceType::Data, None);
    assert_eq!(service.active_bindings(), 3);
    settle().await;

    service.clear_all_resources();
    assert_eq!(service.active_bindings(), 0);
    assert!(!visible.is_active());
    assert!(!hover.is_active());
    assert!(!idle_handle.is_active());
    settle().await;

    host.intersect("card", true);
    host.pointer("nav", PointerEvent::Enter);
    idle.go_idle();
    let seen = drain_for(&mut events, Duration::from_millis(60)).await;
    assert!(queued_urls(&seen).is_empty());
    assert_eq!(service.status().total, 0);
}
