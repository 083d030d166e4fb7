//! Keyed debouncer
//!
//! Each key owns at most one pending tokio task. Scheduling again under the
//! same key aborts the previous task, so only the last call in a burst runs.
//! `cancel_all` aborts everything at session teardown.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use huddle_core::ConversationId;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Timer slots used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Debounced mark-as-read for one conversation
    MarkRead(ConversationId),
    /// Debounced unread-total push
    UnreadPush,
    /// Discovery retry for a conversation seen only through the feed
    Discovery(ConversationId),
}

/// Keyed task registry
#[derive(Debug)]
pub struct Debouncer<K: Eq + Hash> {
    tasks: DashMap<K, JoinHandle<()>>,
    runtime: Handle,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Copy + std::fmt::Debug + Send + Sync + 'static,
{
    /// Debouncer spawning onto the current tokio runtime
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn new() -> Self {
        Self::with_runtime(Handle::current())
    }

    /// Debouncer spawning onto `runtime`; usable from any thread
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            tasks: DashMap::new(),
            runtime,
        }
    }

    /// Run `task` after `delay`, replacing anything pending under `key`
    pub fn schedule<F>(&self, key: K, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        if let Some(previous) = self.tasks.insert(key, handle) {
            previous.abort();
            tracing::trace!(key = ?key, "Debounced timer restarted");
        }
    }

    /// Run `task` now unless a task under `key` is still running
    ///
    /// Returns `false` when an earlier task is still pending.
    pub fn spawn_once<F>(&self, key: K, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_pending(key) {
            return false;
        }
        self.tasks.insert(key, self.runtime.spawn(task));
        true
    }

    /// Abort the task under `key`; returns `true` if one was still pending
    pub fn cancel(&self, key: K) -> bool {
        match self.tasks.remove(&key) {
            Some((_, handle)) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    /// Abort every task; returns the number that were still pending
    pub fn cancel_all(&self) -> usize {
        let mut pending = 0;
        self.tasks.retain(|_, handle| {
            if !handle.is_finished() {
                pending += 1;
            }
            handle.abort();
            false
        });
        pending
    }

    /// Check if a task under `key` has not finished yet
    pub fn is_pending(&self, key: K) -> bool {
        self.tasks
            .get(&key)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of unfinished tasks
    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|h| !h.is_finished()).count()
    }
}

impl<K> Default for Debouncer<K>
where
    K: Eq + Hash + Copy + std::fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
