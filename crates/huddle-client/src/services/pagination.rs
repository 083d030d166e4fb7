//! Pagination service
//!
//! Backward paging from the oldest loaded message, and jumping to a message
//! outside the loaded range.

use huddle_core::{DomainError, MessageId};
use tracing::{debug, instrument};

use crate::context::ClientContext;
use crate::error::{ClientError, ClientResult};
use crate::events::ClientEvent;
use crate::state::window;

/// Pagination service
pub struct PaginationService<'a> {
    ctx: &'a ClientContext,
}

impl<'a> PaginationService<'a> {
    /// Create a new PaginationService
    pub fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    /// Load the page before the oldest loaded message of the active conversation
    ///
    /// Returns `false` without a network call when history is exhausted, a
    /// load for the conversation is already running, or nothing is loaded to
    /// anchor on.
    #[instrument(skip(self))]
    pub async fn load_older(&self) -> ClientResult<bool> {
        let (session_id, _) = self.ctx.require_session()?;

        let (conversation_id, anchor) = {
            let mut state = self.ctx.lock();
            let view = &mut state.view;
            let conversation_id = view.active.ok_or(DomainError::NoActiveConversation)?;
            if !view.has_more(conversation_id) {
                debug!(conversation_id = %conversation_id, "History exhausted");
                return Ok(false);
            }
            if view.loading_older.contains(&conversation_id) {
                debug!(conversation_id = %conversation_id, "Older page already loading");
                return Ok(false);
            }
            let Some(anchor) = window::oldest_server_id(&view.messages) else {
                return Ok(false);
            };
            view.loading_older.insert(conversation_id);
            (conversation_id, anchor)
        };

        let result = self
            .ctx
            .backend()
            .list_messages(
                conversation_id,
                Some(anchor),
                self.ctx.config().messaging.page_size,
            )
            .await;

        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return Err(ClientError::Stale);
        }
        state.view.loading_older.remove(&conversation_id);
        let page = result?;
        state
            .view
            .has_more
            .insert(conversation_id, page.has_more);

        let mut older = page.messages;
        older.sort_by_key(|m| m.created_at);
        self.ctx
            .cache()
            .update_messages(session_id, conversation_id, |messages| {
                window::prepend_page(messages, older.clone())
            })?;

        if state.view.is_active(conversation_id) {
            let added = window::prepend_page(&mut state.view.messages, older);
            if added > 0 {
                self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
            }
            debug!(conversation_id = %conversation_id, added, has_more = page.has_more, "Older page loaded");
        }
        Ok(true)
    }

    /// Make sure `message_id` is loaded in the active conversation
    ///
    /// Fetches a window around the target when it is not already present
    /// and merges it. Returns whether the target is now loaded; the caller
    /// scrolls to it.
    #[instrument(skip(self))]
    pub async fn jump_to(&self, message_id: MessageId) -> ClientResult<bool> {
        let (session_id, _) = self.ctx.require_session()?;

        let conversation_id = {
            let state = self.ctx.lock();
            let conversation_id = state
                .view
                .active
                .ok_or(DomainError::NoActiveConversation)?;
            if window::contains(&state.view.messages, message_id) {
                return Ok(true);
            }
            conversation_id
        };

        let around = self
            .ctx
            .backend()
            .list_messages_around(
                conversation_id,
                message_id,
                self.ctx.config().messaging.context_window,
            )
            .await?;

        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return Err(ClientError::Stale);
        }
        let found = window::contains(&around, message_id);

        let merged = self
            .ctx
            .cache()
            .update_messages(session_id, conversation_id, |messages| {
                window::merge_window(messages, around.clone())
            })?;

        if state.view.is_active(conversation_id) {
            let added = window::merge_window(&mut state.view.messages, around);
            if merged.is_none() {
                self.ctx.cache().put_messages(
                    session_id,
                    conversation_id,
                    state.view.messages.clone(),
                )?;
            }
            self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
            debug!(conversation_id = %conversation_id, added, found, "Jumped to message window");
        }
        Ok(found)
    }
}
