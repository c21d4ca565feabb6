//! Queue abstraction feeding the dispatcher.

use super::ResourceEntry;

/// Abstraction for pending-entry queues.
///
/// Implementations order by priority (highest first), then by `timestamp`,
/// then by submission `seq`, so equal-priority entries leave in submission
/// order.
pub trait PrefetchQueue: Send {
    /// Insert an entry.
    fn enqueue(&mut self, entry: ResourceEntry);
    /// Remove and return the head entry.
    fn dequeue(&mut self) -> Option<ResourceEntry>;
    /// Head entry without removing it.
    fn peek(&self) -> Option<&ResourceEntry>;
    /// Drop every queued entry and return them.
    fn drain(&mut self) -> Vec<ResourceEntry>;
    /// Current depth.
    fn len(&self) -> usize;
    /// Whether the queue holds nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
