//! Pending work queue.

use crate::types::Target;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use tokio::time::Instant;

/// A target waiting for dispatch, together with its assigned slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub target: Target,
    /// Earliest instant this entry may be dispatched.
    pub slot: Instant,
    pub enqueued_at: Instant,
}

impl QueueEntry {
    pub fn new(target: Target, slot: Instant) -> Self {
        Self {
            target,
            slot,
            enqueued_at: Instant::now(),
        }
    }
}

/// FIFO of entries awaiting the next executor round.
///
/// Safe to share between the coordinating task (initial enqueues) and the
/// dispatch futures of a running round (re-enqueues after failures).
#[derive(Debug, Default)]
pub struct PendingQueue {
    items: RwLock<VecDeque<QueueEntry>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, entry: QueueEntry) -> usize {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.push_back(entry);
        items.len()
    }

    /// Remove and return everything queued right now, oldest first.
    ///
    /// Entries enqueued after this call returns are left for the next drain.
    pub fn drain(&self) -> Vec<QueueEntry> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn clear(&self) {
        self.items.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
