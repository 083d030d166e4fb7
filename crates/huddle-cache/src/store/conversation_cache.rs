//! Conversation cache
//!
//! Keeps each conversation's loaded message window (and the conversation list)
//! so switching views does not refetch. The cache belongs to one authenticated
//! session at a time: every access names the caller's session and is rejected
//! unless that session owns the cache. `invalidate_all` drops everything,
//! owner tag included, and must complete before the next session claims it.

use std::collections::HashMap;
use std::sync::Arc;

use huddle_core::{Conversation, ConversationId, Message, SessionId};
use parking_lot::RwLock;

/// Error type for cache operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Cache has no owner")]
    Unclaimed,

    #[error("Cache is owned by session {owner}, not {caller}")]
    NotOwner { owner: SessionId, caller: SessionId },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Default)]
struct CacheState {
    owner: Option<SessionId>,
    conversations: Vec<Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
}

impl CacheState {
    fn check(&self, caller: SessionId) -> CacheResult<()> {
        match self.owner {
            Some(owner) if owner == caller => Ok(()),
            Some(owner) => Err(CacheError::NotOwner { owner, caller }),
            None => Err(CacheError::Unclaimed),
        }
    }
}

/// Session-owned conversation cache
#[derive(Debug, Default)]
pub struct ConversationCache {
    state: RwLock<CacheState>,
}

impl ConversationCache {
    /// Create an empty, unowned cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, unowned cache wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Current owner, if any
    pub fn owner(&self) -> Option<SessionId> {
        self.state.read().owner
    }

    /// Take ownership for `session`
    ///
    /// Succeeds when the cache is unowned or already owned by `session`.
    pub fn claim(&self, session: SessionId) -> CacheResult<()> {
        let mut state = self.state.write();
        match state.owner {
            Some(owner) if owner != session => Err(CacheError::NotOwner {
                owner,
                caller: session,
            }),
            _ => {
                state.owner = Some(session);
                tracing::debug!(session_id = %session, "Conversation cache claimed");
                Ok(())
            }
        }
    }

    /// Drop every entry and the owner tag; returns the number of message entries cleared
    pub fn invalidate_all(&self) -> usize {
        let mut state = self.state.write();
        let cleared = state.messages.len();
        let previous = state.owner.take();
        state.messages.clear();
        state.conversations.clear();
        tracing::debug!(
            previous_owner = ?previous,
            cleared,
            "Conversation cache invalidated"
        );
        cleared
    }

    /// Cached message window for a conversation
    pub fn messages(
        &self,
        session: SessionId,
        conversation_id: ConversationId,
    ) -> CacheResult<Option<Vec<Message>>> {
        let state = self.state.read();
        state.check(session)?;
        Ok(state.messages.get(&conversation_id).cloned())
    }

    /// Cached message window, only if it holds at least one message
    pub fn non_empty_messages(
        &self,
        session: SessionId,
        conversation_id: ConversationId,
    ) -> CacheResult<Option<Vec<Message>>> {
        Ok(self
            .messages(session, conversation_id)?
            .filter(|messages| !messages.is_empty()))
    }

    /// Replace a conversation's message window
    pub fn put_messages(
        &self,
        session: SessionId,
        conversation_id: ConversationId,
        messages: Vec<Message>,
    ) -> CacheResult<()> {
        let mut state = self.state.write();
        state.check(session)?;
        state.messages.insert(conversation_id, messages);
        Ok(())
    }

    /// Mutate an existing entry; `Ok(None)` when the conversation has no entry
    pub fn update_messages<R>(
        &self,
        session: SessionId,
        conversation_id: ConversationId,
        f: impl FnOnce(&mut Vec<Message>) -> R,
    ) -> CacheResult<Option<R>> {
        let mut state = self.state.write();
        state.check(session)?;
        Ok(state.messages.get_mut(&conversation_id).map(f))
    }

    /// Mutate every entry (used for updates whose conversation is unknown)
    pub fn update_all_messages(
        &self,
        session: SessionId,
        mut f: impl FnMut(ConversationId, &mut Vec<Message>),
    ) -> CacheResult<()> {
        let mut state = self.state.write();
        state.check(session)?;
        for (conversation_id, messages) in &mut state.messages {
            f(*conversation_id, messages);
        }
        Ok(())
    }

    /// Cached conversation list (empty when never fetched)
    pub fn conversations(&self, session: SessionId) -> CacheResult<Vec<Conversation>> {
        let state = self.state.read();
        state.check(session)?;
        Ok(state.conversations.clone())
    }

    /// Replace the cached conversation list
    pub fn put_conversations(
        &self,
        session: SessionId,
        conversations: Vec<Conversation>,
    ) -> CacheResult<()> {
        let mut state = self.state.write();
        state.check(session)?;
        state.conversations = conversations;
        Ok(())
    }

    /// Number of conversations with a cached message window
    pub fn entry_count(&self) -> usize {
        self.state.read().messages.len()
    }

    /// Check if nothing at all is cached
    pub fn is_empty(&self) -> bool {
        let state = self.state.read();
        state.messages.is_empty() && state.conversations.is_empty()
    }
}
