//! # huddle-cache
//!
//! Client-side caching and realtime plumbing.
//!
//! ## Features
//!
//! - **Conversation cache**: per-conversation message lists that survive view
//!   switches, owned by exactly one authenticated session at a time
//! - **Feed hub**: in-process fan-out of "row inserted" notifications to
//!   per-table subscriptions
//! - **Realtime connector**: websocket client feeding the hub, with reconnects
//!
//! ## Example
//!
//! ```ignore
//! use huddle_cache::{ConversationCache, FeedHub, RealtimeConnector, RealtimeFeed};
//!
//! let cache = ConversationCache::new_shared();
//! cache.claim(session_id)?;
//!
//! let hub = FeedHub::new_shared();
//! let connector = RealtimeConnector::start(ConnectorConfig::new(url), hub.clone());
//! let mut messages = hub.subscribe(RealtimeTable::Messages)?;
//! while let Some(row) = messages.recv().await { /* ... */ }
//! ```

pub mod pubsub;
pub mod store;

// Re-export store types
pub use store::{CacheError, CacheResult, ConversationCache};

// Re-export pubsub types
pub use pubsub::{
    ConnectorConfig, FeedError, FeedHub, FeedResult, RealtimeConnector, RealtimeFeed,
    RealtimeTopic, Subscription, SubscriptionId,
};
