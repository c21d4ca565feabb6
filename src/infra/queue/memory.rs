//! In-memory stable priority queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{PrefetchQueue, ResourceEntry};

/// Wrapper to make `ResourceEntry` orderable by priority (highest first) and FIFO within priority.
struct PriorityEntry {
    entry: ResourceEntry,
}

impl PartialEq for PriorityEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriorityEntry {}

impl PartialOrd for PriorityEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then older timestamp, then lower seq (reversed for max-heap)
        self.entry
            .priority
            .cmp(&other.entry.priority)
            .then_with(|| other.entry.timestamp.cmp(&self.entry.timestamp))
            .then_with(|| other.entry.seq.cmp(&self.entry.seq))
    }
}

/// In-memory queue storing pending entries in a binary heap.
/// This provides O(log n) enqueue and O(log n) dequeue operations.
#[derive(Default)]
pub struct InMemoryQueue {
    entries: BinaryHeap<PriorityEntry>,
}

impl InMemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Urls currently queued, in dispatch order.
    #[must_use]
    pub fn urls_in_order(&self) -> Vec<String> {
        let mut sorted: Vec<&PriorityEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.cmp(a));
        sorted.into_iter().map(|p| p.entry.url.clone()).collect()
    }
}

impl PrefetchQueue for InMemoryQueue {
    fn enqueue(&mut self, entry: ResourceEntry) {
        self.entries.push(PriorityEntry { entry });
    }

    fn dequeue(&mut self) -> Option<ResourceEntry> {
        self.entries.pop().map(|p| p.entry)
    }

    fn peek(&self) -> Option<&ResourceEntry> {
        self.entries.peek().map(|p| &p.entry)
    }

    fn drain(&mut self) -> Vec<ResourceEntry> {
        self.entries.drain().map(|p| p.entry).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
