//! Bounded set of recently seen realtime message ids

use std::collections::{HashSet, VecDeque};

use huddle_core::MessageId;

/// Ids remembered for duplicate-delivery suppression
pub const RECENT_CAPACITY: usize = 512;

/// FIFO-bounded id set
#[derive(Debug, Clone)]
pub struct RecentIds {
    capacity: usize,
    order: VecDeque<MessageId>,
    members: HashSet<MessageId>,
}

impl RecentIds {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Remember `id`; returns `false` if it was already remembered
    pub fn insert(&mut self, id: MessageId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        true
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for RecentIds {
    fn default() -> Self {
        Self::with_capacity(RECENT_CAPACITY)
    }
}
