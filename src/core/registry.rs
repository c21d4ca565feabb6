//! Resource registry: the de-duplication authority and owner of the pending queue.
//!
//! Every tracked url maps to exactly one [`ResourceEntry`]. A url whose entry is
//! `pending` or `loading` cannot be submitted again; a `loaded` url stays
//! de-duplicated until [`ResourceRegistry::clear_all`]. Failed entries are either
//! waiting on a retry timer or terminal; terminal ones are collected in a
//! separate set so a reconnection sweep can resubmit them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{PrefetchConfig, PrefetchQueue, ResourceEntry};
use crate::infra::queue::InMemoryQueue;
use crate::util::clock::now_ms;
use crate::util::types::{ResourceStatus, ResourceType};

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    /// A new pending entry was queued.
    Queued,
    /// The url is already loaded; nothing to do.
    AlreadyLoaded,
    /// The url is pending or loading; nothing to do.
    AlreadyActive,
}

/// Counters over every tracked resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Tracked resources.
    pub total: usize,
    /// Waiting for admission.
    pub pending: usize,
    /// Hint in flight.
    pub loading: usize,
    /// Fetched.
    pub loaded: usize,
    /// Waiting on a retry or terminal.
    pub failed: usize,
}

/// Registry of tracked resources plus the queue of pending ones.
pub struct ResourceRegistry<Q = InMemoryQueue> {
    entries: HashMap<String, ResourceEntry>,
    terminal_failed: HashSet<String>,
    queue: Q,
    next_seq: u64,
    max_tracked: Option<usize>,
}

impl Default for ResourceRegistry<InMemoryQueue> {
    fn default() -> Self {
        Self::new(InMemoryQueue::new(), None)
    }
}

impl<Q: PrefetchQueue> ResourceRegistry<Q> {
    /// Create a registry over `queue`. `max_tracked = None` keeps every
    /// loaded and failed entry for the life of the registry.
    pub fn new(queue: Q, max_tracked: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            terminal_failed: HashSet::new(),
            queue,
            next_seq: 0,
            max_tracked,
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Track and queue `url`, unless it is loaded or already in flight.
    pub fn submit(&mut self, url: &str, kind: ResourceType, config: &PrefetchConfig) -> SubmitOutcome {
        if let Some(existing) = self.entries.get(url) {
            if existing.status == ResourceStatus::Loaded {
                return SubmitOutcome::AlreadyLoaded;
            }
            if existing.is_active() {
                return SubmitOutcome::AlreadyActive;
            }
        }
        self.terminal_failed.remove(url);
        let seq = self.bump_seq();
        let entry = ResourceEntry::new(url, kind, config.priority, seq);
        self.queue.enqueue(entry.clone());
        self.entries.insert(url.to_string(), entry);
        SubmitOutcome::Queued
    }

    /// Pop the head of the queue.
    pub fn dequeue(&mut self) -> Option<ResourceEntry> {
        self.queue.dequeue()
    }

    /// Put a deferred entry back, keeping its queue position.
    pub fn requeue(&mut self, entry: ResourceEntry) {
        self.queue.enqueue(entry);
    }

    /// Current status of `url`, if tracked.
    #[must_use]
    pub fn status_of(&self, url: &str) -> Option<ResourceStatus> {
        self.entries.get(url).map(|e| e.status)
    }

    /// Tracked entry for `url`.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<&ResourceEntry> {
        self.entries.get(url)
    }

    /// Whether the queue copy `(url, seq)` is still the live pending entry.
    #[must_use]
    pub fn is_queued(&self, url: &str, seq: u64) -> bool {
        self.entries
            .get(url)
            .is_some_and(|e| e.seq == seq && e.status == ResourceStatus::Pending)
    }

    /// Whether `(url, seq)` is still the tracked attempt.
    #[must_use]
    pub fn is_current(&self, url: &str, seq: u64) -> bool {
        self.entries.get(url).is_some_and(|e| e.seq == seq)
    }

    /// Whether `url` is in the terminal-failed set.
    #[must_use]
    pub fn is_terminal_failed(&self, url: &str) -> bool {
        self.terminal_failed.contains(url)
    }

    fn transition(&mut self, url: &str, status: ResourceStatus) -> Option<&mut ResourceEntry> {
        let entry = self.entries.get_mut(url)?;
        entry.transition(status);
        Some(entry)
    }

    /// `pending -> loading`.
    pub fn mark_loading(&mut self, url: &str) -> bool {
        self.transition(url, ResourceStatus::Loading).is_some()
    }

    /// `loading -> loaded`. Ignored unless the entry is loading.
    pub fn mark_loaded(&mut self, url: &str) -> bool {
        if self.status_of(url) != Some(ResourceStatus::Loading) {
            return false;
        }
        self.transition(url, ResourceStatus::Loaded);
        self.enforce_capacity();
        true
    }

    /// `loading -> failed`. Returns the retry count before this failure.
    pub fn mark_failed(&mut self, url: &str) -> Option<u32> {
        if self.status_of(url) != Some(ResourceStatus::Loading) {
            return None;
        }
        self.transition(url, ResourceStatus::Failed).map(|e| e.retry_count)
    }

    /// Record that a retry is scheduled. Returns the incremented retry count.
    pub fn increment_retry(&mut self, url: &str) -> Option<u32> {
        let entry = self.entries.get_mut(url)?;
        entry.retry_count += 1;
        Some(entry.retry_count)
    }

    /// Move a failed entry into the terminal-failed set.
    pub fn mark_terminal(&mut self, url: &str) {
        if self.status_of(url) == Some(ResourceStatus::Failed) {
            self.terminal_failed.insert(url.to_string());
            self.enforce_capacity();
        }
    }

    /// Requeue a failed entry whose retry timer fired.
    ///
    /// `seq` identifies the attempt the timer was armed for. Only that exact
    /// failed attempt is requeued; a resubmission or clear in the meantime
    /// makes the timer stale even if the new attempt failed the same way.
    pub fn requeue_retry(&mut self, url: &str, seq: u64) -> bool {
        let fresh = self.entries.get(url).is_some_and(|e| {
            e.seq == seq && e.status == ResourceStatus::Failed && !self.terminal_failed.contains(url)
        });
        if !fresh {
            return false;
        }
        let seq = self.bump_seq();
        let now = now_ms();
        let Some(entry) = self.entries.get_mut(url) else {
            return false;
        };
        entry.seq = seq;
        entry.timestamp = now;
        entry.transition(ResourceStatus::Pending);
        let queued = entry.clone();
        self.queue.enqueue(queued);
        true
    }

    /// Move every failed entry still waiting on a retry timer into the
    /// terminal-failed set. Returns the moved urls.
    pub fn abandon_pending_retries(&mut self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .entries
            .values()
            .filter(|e| e.status == ResourceStatus::Failed && !self.terminal_failed.contains(&e.url))
            .map(|e| e.url.clone())
            .collect();
        urls.sort();
        self.terminal_failed.extend(urls.iter().cloned());
        urls
    }

    /// Resubmit every terminal-failed entry with its retry count reset.
    /// Returns the resubmitted urls in submission order.
    pub fn resubmit_terminal_failed(&mut self) -> Vec<String> {
        let mut urls: Vec<String> = self.terminal_failed.drain().collect();
        urls.sort_by_key(|u| self.entries.get(u).map_or(u64::MAX, |e| e.seq));
        let now = now_ms();
        for url in &urls {
            let seq = self.next_seq;
            self.next_seq += 1;
            if let Some(entry) = self.entries.get_mut(url) {
                entry.retry_count = 0;
                entry.seq = seq;
                entry.timestamp = now;
                entry.transition(ResourceStatus::Pending);
                self.queue.enqueue(entry.clone());
            }
        }
        urls
    }

    /// Drop every pending entry. Returns how many were removed.
    pub fn clear_queue(&mut self) -> usize {
        let drained = self.queue.drain();
        let mut removed = 0;
        for entry in drained {
            if self.status_of(&entry.url) == Some(ResourceStatus::Pending) {
                self.entries.remove(&entry.url);
                removed += 1;
            }
        }
        removed
    }

    /// Forget every entry, queued or not.
    pub fn clear_all(&mut self) {
        self.queue.drain();
        self.entries.clear();
        self.terminal_failed.clear();
    }

    /// Queue depth.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Counters over every tracked entry.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        let mut snap = StatusSnapshot {
            total: self.entries.len(),
            ..StatusSnapshot::default()
        };
        for entry in self.entries.values() {
            match entry.status {
                ResourceStatus::Pending => snap.pending += 1,
                ResourceStatus::Loading => snap.loading += 1,
                ResourceStatus::Loaded => snap.loaded += 1,
                ResourceStatus::Failed => snap.failed += 1,
            }
        }
        snap
    }

    fn is_evictable(&self, entry: &ResourceEntry) -> bool {
        entry.status == ResourceStatus::Loaded || self.terminal_failed.contains(&entry.url)
    }

    /// Evict the least recently touched terminal entries until the registry
    /// fits `max_tracked`. In-flight and pending entries are never evicted.
    fn enforce_capacity(&mut self) {
        let Some(cap) = self.max_tracked else {
            return;
        };
        while self.entries.len() > cap {
            let victim = self
                .entries
                .values()
                .filter(|e| self.is_evictable(e))
                .min_by_key(|e| (e.last_accessed, e.seq))
                .map(|e| e.url.clone());
            let Some(url) = victim else {
                break;
            };
            tracing::debug!(url = %url, "evicting resource from registry");
            self.entries.remove(&url);
            self.terminal_failed.remove(&url);
        }
    }
}
