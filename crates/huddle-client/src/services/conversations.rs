//! Conversation service
//!
//! Conversation list, selection, initial message load, reaction and pin
//! hydration, threads, and discovery of conversations first seen through the
//! realtime feed.

use std::collections::HashMap;

use huddle_core::events::{PinRow, ReactionRow};
use huddle_core::{
    sort_by_activity, Conversation, ConversationId, DomainError, Message, MessageId, PinMarker,
    ReactionSummary, SessionId, UserId,
};
use tracing::{debug, error, info, instrument, warn};

use crate::context::ClientContext;
use crate::error::{ClientError, ClientResult};
use crate::events::ClientEvent;
use crate::state::{window, ThreadView, ViewState};
use crate::timing::{RetryPolicy, TimerKey};

use super::read_state::ReadStateService;

/// Conversation service
pub struct ConversationService<'a> {
    ctx: &'a ClientContext,
}

impl<'a> ConversationService<'a> {
    /// Create a new ConversationService
    pub fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    // === Conversation list ===

    /// Load the conversation list, from the cache unless `force` is set
    ///
    /// Returns the number of conversations installed.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn refresh_conversations(
        &self,
        session_id: SessionId,
        force: bool,
    ) -> ClientResult<usize> {
        if !force {
            let cached = self.ctx.cache().conversations(session_id)?;
            if !cached.is_empty() {
                let mut state = self.ctx.lock();
                if !state.is_current(session_id) {
                    return Err(ClientError::Stale);
                }
                let count = cached.len();
                self.install_conversations(session_id, &mut state.view, cached);
                debug!(count, "Conversations served from cache");
                return Ok(count);
            }
        }

        let fetched = self.ctx.backend().list_conversations().await?;

        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return Err(ClientError::Stale);
        }
        let count = fetched.len();
        self.install_conversations(session_id, &mut state.view, fetched);
        info!(count, "Conversations loaded");
        Ok(count)
    }

    fn install_conversations(
        &self,
        session_id: SessionId,
        view: &mut ViewState,
        conversations: Vec<Conversation>,
    ) {
        view.conversations = conversations;
        if let Some(active) = view.active {
            if let Some(conversation) = view.conversation_mut(active) {
                conversation.unread_count = 0;
            }
        }
        self.conversations_changed(session_id, view);
    }

    /// Re-sort, write through to the cache, notify, and resync unread
    pub(crate) fn conversations_changed(&self, session_id: SessionId, view: &mut ViewState) {
        sort_by_activity(&mut view.conversations);
        if let Err(e) = self
            .ctx
            .cache()
            .put_conversations(session_id, view.conversations.clone())
        {
            warn!(error = %e, "Conversation list not cached");
        }
        self.ctx.emit(ClientEvent::ConversationsChanged);
        ReadStateService::new(self.ctx).sync_unread(session_id, view);
    }

    // === Selection ===

    /// Make `conversation_id` the active conversation
    ///
    /// Serves the cached window when there is one, otherwise fetches the
    /// latest page. Reactions and pins are hydrated afterwards; their failure
    /// only raises a notice.
    #[instrument(skip(self))]
    pub async fn select(&self, conversation_id: ConversationId) -> ClientResult<()> {
        let (session_id, _) = self.ctx.require_session()?;
        let cached = self
            .ctx
            .cache()
            .non_empty_messages(session_id, conversation_id)?;

        {
            let mut state = self.ctx.lock();
            if !state.is_current(session_id) {
                return Err(ClientError::Stale);
            }
            let view = &mut state.view;
            view.active = Some(conversation_id);
            let had_thread = view.thread.take().is_some();
            view.messages = cached.clone().unwrap_or_default();
            if let Some(conversation) = view.conversation_mut(conversation_id) {
                conversation.unread_count = 0;
            }
            self.conversations_changed(session_id, view);

            self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
            if had_thread {
                self.ctx.emit(ClientEvent::ThreadChanged { parent_id: None });
            }
        }

        if cached.is_none() {
            self.load_messages(session_id, conversation_id).await?;
        }

        self.hydrate(session_id, conversation_id).await;
        if self.ctx.lock().view.is_active(conversation_id) {
            ReadStateService::new(self.ctx).mark_as_read(session_id, conversation_id);
        }
        Ok(())
    }

    /// Fetch the latest page of `conversation_id`
    ///
    /// The page is written to the cache while the session is current and
    /// applied to the visible list only while the conversation is still
    /// active. Anything already visible (placeholders, realtime arrivals) is
    /// merged in.
    pub(crate) async fn load_messages(
        &self,
        session_id: SessionId,
        conversation_id: ConversationId,
    ) -> ClientResult<usize> {
        let page = self
            .ctx
            .backend()
            .list_messages(conversation_id, None, self.ctx.config().messaging.page_size)
            .await?;

        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return Err(ClientError::Stale);
        }

        let mut messages = page.messages;
        messages.sort_by_key(|m| m.created_at);
        let count = messages.len();
        state.view.has_more.insert(conversation_id, page.has_more);

        if state.view.is_active(conversation_id) {
            let visible = std::mem::take(&mut state.view.messages);
            window::merge_window(&mut messages, visible);
            state.view.messages = messages.clone();
            self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
        } else {
            debug!(conversation_id = %conversation_id, "Conversation no longer active, caching only");
        }

        self.ctx
            .cache()
            .put_messages(session_id, conversation_id, messages)?;
        debug!(conversation_id = %conversation_id, count, has_more = page.has_more, "Messages loaded");
        Ok(count)
    }

    /// Fold reactions and pins into the loaded messages
    pub(crate) async fn hydrate(&self, session_id: SessionId, conversation_id: ConversationId) {
        let (reactions, pins) = tokio::join!(
            self.ctx.backend().list_reactions(conversation_id),
            self.ctx.backend().list_pins(conversation_id),
        );

        let reactions = reactions
            .map_err(|e| self.ctx.report(&ClientError::from(e)))
            .ok();
        let pins = pins.map_err(|e| self.ctx.report(&ClientError::from(e))).ok();
        if reactions.is_none() && pins.is_none() {
            return;
        }

        let mut state = self.ctx.lock();
        let Some(me) = state.user().map(|u| u.id) else {
            return;
        };
        if !state.is_current(session_id) {
            return;
        }

        let annotate = |messages: &mut Vec<Message>| {
            if let Some(rows) = &reactions {
                apply_reactions(messages, rows, me);
            }
            if let Some(rows) = &pins {
                apply_pins(messages, rows);
            }
        };

        if let Err(e) = self
            .ctx
            .cache()
            .update_messages(session_id, conversation_id, &annotate)
        {
            warn!(error = %e, "Annotations not cached");
        }
        if state.view.is_active(conversation_id) {
            annotate(&mut state.view.messages);
            self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
        }
    }

    // === Threads ===

    /// Open the thread under `parent_id` and load its replies
    #[instrument(skip(self))]
    pub async fn open_thread(&self, parent_id: MessageId) -> ClientResult<()> {
        let (session_id, _) = self.ctx.require_session()?;

        {
            let mut state = self.ctx.lock();
            let parent = state
                .view
                .messages
                .iter()
                .find(|m| m.id == parent_id)
                .cloned()
                .ok_or(DomainError::MessageNotFound(parent_id))?;
            let mut thread = ThreadView::new(parent);
            // A placeholder has no replies on the server yet
            thread.loading = !parent_id.is_temp();
            state.view.thread = Some(thread);
            self.ctx.emit(ClientEvent::ThreadChanged {
                parent_id: Some(parent_id),
            });
        }

        if parent_id.is_temp() {
            return Ok(());
        }

        let result = self.ctx.backend().list_thread_replies(parent_id).await;

        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return Err(ClientError::Stale);
        }
        let Some(thread) = state.view.thread_for(parent_id) else {
            debug!(parent_id = %parent_id, "Thread closed before replies arrived");
            return Err(ClientError::Stale);
        };
        thread.loading = false;
        let replies = result?;
        let added = window::merge_window(&mut thread.replies, replies);
        self.ctx.emit(ClientEvent::ThreadChanged {
            parent_id: Some(parent_id),
        });
        debug!(parent_id = %parent_id, added, "Thread replies loaded");
        Ok(())
    }

    /// Close the open thread, if any
    pub fn close_thread(&self) -> bool {
        let closed = self.ctx.lock().view.thread.take().is_some();
        if closed {
            self.ctx.emit(ClientEvent::ThreadChanged { parent_id: None });
        }
        closed
    }

    // === Discovery ===

    /// Start resolving a conversation first seen through the realtime feed
    ///
    /// Forces conversation-list refreshes on the discovery schedule until the
    /// conversation appears or attempts run out. Only one discovery per
    /// conversation runs at a time.
    pub(crate) fn spawn_discovery(&self, session_id: SessionId, conversation_id: ConversationId) {
        let ctx = self.ctx.clone();
        let policy = RetryPolicy::discovery(&self.ctx.config().timing);

        let started = self.ctx.timers().spawn_once(
            TimerKey::Discovery(conversation_id),
            async move {
                let service = &ConversationService::new(&ctx);
                let outcome = policy
                    .run(move |attempt| async move {
                        service
                            .discovery_attempt(session_id, conversation_id, attempt)
                            .await
                    })
                    .await;

                match outcome {
                    Some(true) => info!(conversation_id = %conversation_id, "Conversation discovered"),
                    Some(false) => debug!(conversation_id = %conversation_id, "Discovery abandoned, session ended"),
                    None => error!(
                        conversation_id = %conversation_id,
                        "Conversation from realtime feed could not be resolved"
                    ),
                }
            },
        );

        if started {
            debug!(conversation_id = %conversation_id, "Discovery started");
        }
    }

    /// `Some(true)` when found, `Some(false)` to give up, `None` to retry
    async fn discovery_attempt(
        &self,
        session_id: SessionId,
        conversation_id: ConversationId,
        attempt: u32,
    ) -> Option<bool> {
        match self.refresh_conversations(session_id, true).await {
            Ok(_) => self.knows(conversation_id).then_some(true),
            Err(e) if e.is_stale_for(self.ctx.session_id()) => Some(false),
            Err(e) => {
                warn!(attempt, error = %e, "Discovery refresh failed");
                None
            }
        }
    }

    fn knows(&self, conversation_id: ConversationId) -> bool {
        self.ctx.lock().view.knows_conversation(conversation_id)
    }
}

/// Replace each message's reactions with the aggregate of `rows`
fn apply_reactions(messages: &mut [Message], rows: &[ReactionRow], me: UserId) {
    let mut by_message: HashMap<_, Vec<&ReactionRow>> = HashMap::new();
    for row in rows {
        by_message.entry(row.message_id).or_default().push(row);
    }

    for message in messages.iter_mut() {
        let Some(server_id) = message.id.server_id() else {
            continue;
        };
        message.reactions.clear();
        for row in by_message.get(&server_id).into_iter().flatten() {
            let summary = message
                .reactions
                .entry(row.reaction_type.clone())
                .or_insert_with(ReactionSummary::default);
            summary.count += 1;
            summary.reacted_by_me |= UserId::from(row.user_id) == me;
        }
    }
}

/// Set or clear each message's pin marker from `rows`
fn apply_pins(messages: &mut [Message], rows: &[PinRow]) {
    for message in messages.iter_mut() {
        let Some(server_id) = message.id.server_id() else {
            continue;
        };
        message.pin = rows
            .iter()
            .find(|row| row.message_id == server_id)
            .map(|row| PinMarker {
                pinned_by: UserId::from(row.pinned_by),
                pinned_at: row.pinned_at,
            });
    }
}
