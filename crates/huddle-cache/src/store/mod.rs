//! Session-owned conversation cache

mod conversation_cache;

pub use conversation_cache::{CacheError, CacheResult, ConversationCache};
