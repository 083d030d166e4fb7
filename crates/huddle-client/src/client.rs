//! Chat client facade
//!
//! The entry point UI code talks to. Every operation delegates to a service;
//! errors the user should see are also raised as [`ClientEvent::Notice`].

use huddle_core::{
    Conversation, ConversationId, Message, MessageId, OutgoingFile, RowInserted, SessionId,
};
use tokio::sync::broadcast;

use crate::context::{ClientContext, ClientContextBuilder};
use crate::error::ClientResult;
use crate::events::ClientEvent;
use crate::services::{
    ConversationService, PaginationService, ReadStateService, ReconcileOutcome, Reconciler,
    SendReport, SendService, SessionService,
};
use crate::state::{CurrentUser, ThreadView};

/// Chat client
#[derive(Debug, Clone)]
pub struct ChatClient {
    ctx: ClientContext,
}

impl ChatClient {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    pub fn builder() -> ClientContextBuilder {
        ClientContextBuilder::new()
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    fn surface<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(e) = &result {
            self.ctx.report(e);
        }
        result
    }

    // === Session ===

    /// Sign in (or switch) to `user`
    ///
    /// The realtime pump runs on the client's runtime, so this may be called
    /// from outside it.
    pub fn sign_in(&self, user: CurrentUser) -> ClientResult<SessionId> {
        SessionService::new(&self.ctx).sign_in(user)
    }

    /// Sign out; returns `false` if nobody was signed in
    pub fn sign_out(&self) -> bool {
        SessionService::new(&self.ctx).sign_out()
    }

    // === Conversations ===

    /// Load the conversation list and reload the active conversation
    ///
    /// Without `force`, cached data is served when present.
    pub async fn refresh(&self, force: bool) -> ClientResult<()> {
        let result = self.refresh_inner(force).await;
        self.surface(result)
    }

    async fn refresh_inner(&self, force: bool) -> ClientResult<()> {
        let (session_id, _) = self.ctx.require_session()?;
        let service = ConversationService::new(&self.ctx);
        service.refresh_conversations(session_id, force).await?;

        let Some(active) = self.active_conversation() else {
            return Ok(());
        };
        let cached = if force {
            None
        } else {
            self.ctx.cache().non_empty_messages(session_id, active)?
        };
        if cached.is_none() {
            service.load_messages(session_id, active).await?;
            service.hydrate(session_id, active).await;
        }
        Ok(())
    }

    /// Make `conversation_id` the active conversation
    pub async fn select_conversation(&self, conversation_id: ConversationId) -> ClientResult<()> {
        let result = ConversationService::new(&self.ctx)
            .select(conversation_id)
            .await;
        self.surface(result)
    }

    // === Messages ===

    /// Send text and files to the active conversation (or a thread)
    pub async fn send_message(
        &self,
        text: &str,
        parent_id: Option<MessageId>,
        files: Vec<OutgoingFile>,
    ) -> ClientResult<SendReport> {
        let result = SendService::new(&self.ctx).send(text, parent_id, files).await;
        self.surface(result)
    }

    /// Load the next older page; `false` when nothing was requested
    pub async fn load_older_messages(&self) -> ClientResult<bool> {
        let result = PaginationService::new(&self.ctx).load_older().await;
        self.surface(result)
    }

    /// Make sure `message_id` is loaded; `true` when it is
    pub async fn jump_to_message(&self, message_id: MessageId) -> ClientResult<bool> {
        let result = PaginationService::new(&self.ctx).jump_to(message_id).await;
        self.surface(result)
    }

    // === Threads ===

    pub async fn open_thread(&self, parent_id: MessageId) -> ClientResult<()> {
        let result = ConversationService::new(&self.ctx)
            .open_thread(parent_id)
            .await;
        self.surface(result)
    }

    pub fn close_thread(&self) -> bool {
        ConversationService::new(&self.ctx).close_thread()
    }

    // === Read state ===

    /// Request a debounced mark-as-read for `conversation_id`
    ///
    /// The debounce timer runs on the client's runtime.
    pub fn mark_as_read(&self, conversation_id: ConversationId) -> bool {
        match self.ctx.session_id() {
            Some(session_id) => {
                ReadStateService::new(&self.ctx).mark_as_read(session_id, conversation_id)
            }
            None => false,
        }
    }

    // === Realtime ===

    /// Apply a notification directly, bypassing the feed subscription
    ///
    /// Follow-up work (discovery, mark-as-read) runs on the client's runtime.
    pub fn handle_realtime(&self, row: &RowInserted) -> ReconcileOutcome {
        match self.ctx.session_id() {
            Some(session_id) => Reconciler::new(&self.ctx).apply(session_id, row),
            None => ReconcileOutcome::Ignored,
        }
    }

    // === Snapshots ===

    pub fn session_id(&self) -> Option<SessionId> {
        self.ctx.session_id()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.ctx.lock().user().cloned()
    }

    pub fn active_conversation(&self) -> Option<ConversationId> {
        self.ctx.lock().view.active
    }

    pub fn visible_messages(&self) -> Vec<Message> {
        self.ctx.lock().view.messages.clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.ctx.lock().view.conversations.clone()
    }

    pub fn conversation(&self, conversation_id: ConversationId) -> Option<Conversation> {
        self.ctx
            .lock()
            .view
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    pub fn unread_total(&self) -> u32 {
        self.ctx.lock().view.unread_total
    }

    pub fn thread(&self) -> Option<ThreadView> {
        self.ctx.lock().view.thread.clone()
    }

    /// Whether older history may exist for `conversation_id`
    pub fn has_more(&self, conversation_id: ConversationId) -> bool {
        self.ctx.lock().view.has_more(conversation_id)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.ctx.subscribe_events()
    }
}

impl From<ClientContext> for ChatClient {
    fn from(ctx: ClientContext) -> Self {
        Self::new(ctx)
    }
}
