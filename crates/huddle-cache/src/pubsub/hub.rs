//! In-process feed hub.
//!
//! Fans "row inserted" notifications out to every subscription of the row's
//! table. Each subscription owns an unbounded channel, so unsubscribing drops
//! the sender and the subscriber's receive loop ends on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use huddle_core::{RealtimeTable, RowInserted};
use tokio::sync::mpsc;

/// Error type for feed operations
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed is shut down")]
    Closed,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Failed to parse frame: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Live subscription to one table's inserts
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub table: RealtimeTable,
    receiver: mpsc::UnboundedReceiver<RowInserted>,
}

impl Subscription {
    /// Next notification; `None` once unsubscribed or the feed shut down
    pub async fn recv(&mut self) -> Option<RowInserted> {
        self.receiver.recv().await
    }

    /// Split into handle and raw receiver
    pub fn into_parts(self) -> (SubscriptionId, mpsc::UnboundedReceiver<RowInserted>) {
        (self.id, self.receiver)
    }
}

/// Realtime feed port
pub trait RealtimeFeed: Send + Sync {
    /// Subscribe to inserts of `table`
    fn subscribe(&self, table: RealtimeTable) -> FeedResult<Subscription>;

    /// Cancel a subscription; returns `false` if it was already gone
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

struct SubscriberEntry {
    table: RealtimeTable,
    sender: mpsc::UnboundedSender<RowInserted>,
}

/// In-process fan-out hub
pub struct FeedHub {
    subscribers: DashMap<SubscriptionId, SubscriberEntry>,
    next_id: AtomicU64,
}

impl FeedHub {
    /// Create a new hub
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Deliver a notification to every subscriber of its table
    ///
    /// Rows for tables nobody subscribed to are still delivered to nobody
    /// without error. Returns the number of subscribers reached.
    pub fn publish(&self, row: &RowInserted) -> usize {
        let Some(table) = RealtimeTable::parse(&row.table) else {
            tracing::trace!(table = %row.table, "Dropping row for unknown table");
            return 0;
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for entry in &self.subscribers {
            if entry.table != table {
                continue;
            }
            if entry.sender.send(row.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*entry.key());
            }
        }

        // Receivers dropped without unsubscribing
        for id in closed {
            self.subscribers.remove(&id);
        }

        delivered
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Tables with at least one live subscription
    pub fn subscribed_tables(&self) -> Vec<RealtimeTable> {
        let mut tables: Vec<RealtimeTable> = Vec::new();
        for entry in &self.subscribers {
            if !tables.contains(&entry.table) {
                tables.push(entry.table);
            }
        }
        tables
    }

    /// Drop every subscription
    pub fn close_all(&self) {
        self.subscribers.clear();
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeFeed for FeedHub {
    fn subscribe(&self, table: RealtimeTable) -> FeedResult<Subscription> {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .insert(id, SubscriberEntry { table, sender });

        tracing::debug!(subscription = %id, table = %table, "Subscribed to realtime table");

        Ok(Subscription {
            id,
            table,
            receiver,
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.remove(&id).is_some();
        if removed {
            tracing::debug!(subscription = %id, "Unsubscribed from realtime table");
        }
        removed
    }
}

impl std::fmt::Debug for FeedHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedHub")
            .field("subscriptions", &self.subscribers.len())
            .finish()
    }
}
