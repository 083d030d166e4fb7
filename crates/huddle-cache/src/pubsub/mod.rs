//! Realtime feed: topic naming, in-process hub, and websocket connector

mod channels;
mod connector;
mod hub;

pub use channels::{RealtimeTopic, TOPIC_PREFIX};
pub use connector::{ConnectorConfig, FeedFrame, RealtimeConnector};
pub use hub::{FeedError, FeedHub, FeedResult, RealtimeFeed, Subscription, SubscriptionId};
