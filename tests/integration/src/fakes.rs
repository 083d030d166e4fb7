//! In-memory backend and storage doubles
//!
//! Both record every call with the (paused) tokio clock so tests can check
//! debounce timing, and expose switches to script failures and delays.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use huddle_core::events::{PinRow, ReactionRow};
use huddle_core::{
    Author, BackendResult, ChatBackend, Conversation, ConversationId, DomainError,
    FileAttachment, FileUploader, Message, MessageId, MessagePage, NewMessage, OutgoingFile,
    UploadedFile, UserId,
};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Every call the fake backend has served
#[derive(Debug, Clone, Default)]
pub struct BackendCalls {
    pub list_conversations: usize,
    pub list_messages: Vec<(ConversationId, Option<MessageId>)>,
    pub list_around: Vec<MessageId>,
    pub list_replies: Vec<MessageId>,
    pub sent: Vec<NewMessage>,
    pub mark_read: Vec<(ConversationId, Instant)>,
    pub unread_pushes: Vec<(u32, Instant)>,
}

#[derive(Default)]
struct FakeData {
    conversations: Vec<Conversation>,
    /// Listed only from the given `list_conversations` call onwards
    hidden: Vec<(usize, Conversation)>,
    history: HashMap<ConversationId, Vec<Message>>,
    replies: HashMap<MessageId, Vec<Message>>,
    reactions: HashMap<ConversationId, Vec<ReactionRow>>,
    pins: HashMap<ConversationId, Vec<PinRow>>,
    list_delay: HashMap<ConversationId, Duration>,
    fail_list_messages: bool,
    fail_reactions: bool,
    fail_mark_read: bool,
    fail_sends: usize,
    newest_first: bool,
    /// Ids handed to the next confirmed inserts, in order
    next_ids: VecDeque<uuid::Uuid>,
}

/// Scriptable [`ChatBackend`]
#[derive(Default)]
pub struct FakeBackend {
    data: Mutex<FakeData>,
    calls: Mutex<BackendCalls>,
    send_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> BackendCalls {
        self.calls.lock().clone()
    }

    pub fn add_conversation(&self, conversation: Conversation) {
        self.data.lock().conversations.push(conversation);
    }

    /// List `conversation` starting with the `call`-th conversation-list request
    pub fn reveal_on_call(&self, call: usize, conversation: Conversation) {
        self.data.lock().hidden.push((call, conversation));
    }

    /// Full history of a conversation, oldest first
    pub fn set_history(&self, conversation_id: ConversationId, messages: Vec<Message>) {
        self.data.lock().history.insert(conversation_id, messages);
    }

    pub fn set_replies(&self, parent_id: MessageId, replies: Vec<Message>) {
        self.data.lock().replies.insert(parent_id, replies);
    }

    pub fn set_reactions(&self, conversation_id: ConversationId, rows: Vec<ReactionRow>) {
        self.data.lock().reactions.insert(conversation_id, rows);
    }

    pub fn set_pins(&self, conversation_id: ConversationId, rows: Vec<PinRow>) {
        self.data.lock().pins.insert(conversation_id, rows);
    }

    /// Delay message-list responses for one conversation
    pub fn delay_lists(&self, conversation_id: ConversationId, delay: Duration) {
        self.data.lock().list_delay.insert(conversation_id, delay);
    }

    /// Return message-list pages newest first
    pub fn newest_first(&self, reversed: bool) {
        self.data.lock().newest_first = reversed;
    }

    pub fn fail_list_messages(&self, fail: bool) {
        self.data.lock().fail_list_messages = fail;
    }

    pub fn fail_reactions(&self, fail: bool) {
        self.data.lock().fail_reactions = fail;
    }

    pub fn fail_mark_read(&self, fail: bool) {
        self.data.lock().fail_mark_read = fail;
    }

    /// Fail the next `count` message inserts
    pub fn fail_next_sends(&self, count: usize) {
        self.data.lock().fail_sends = count;
    }

    /// Reserve the id the next confirmed insert will carry
    pub fn assign_next_id(&self) -> MessageId {
        let id = uuid::Uuid::new_v4();
        self.data.lock().next_ids.push_back(id);
        MessageId::Server(id)
    }

    /// Hold every insert until a permit is added to the returned gate
    pub fn gate_sends(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.send_gate.lock() = Some(gate.clone());
        gate
    }

    fn backend_error(what: &str) -> DomainError {
        DomainError::Backend(format!("{what} failed"))
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn list_conversations(&self) -> BackendResult<Vec<Conversation>> {
        let call = {
            let mut calls = self.calls.lock();
            calls.list_conversations += 1;
            calls.list_conversations
        };
        let data = self.data.lock();
        let mut conversations = data.conversations.clone();
        conversations.extend(
            data.hidden
                .iter()
                .filter(|(from, _)| call >= *from)
                .map(|(_, conversation)| conversation.clone()),
        );
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        before: Option<MessageId>,
        page_size: usize,
    ) -> BackendResult<MessagePage> {
        self.calls.lock().list_messages.push((conversation_id, before));
        let delay = self.data.lock().list_delay.get(&conversation_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let data = self.data.lock();
        if data.fail_list_messages {
            return Err(Self::backend_error("list messages"));
        }
        let history = data.history.get(&conversation_id).cloned().unwrap_or_default();
        let end = match before {
            Some(anchor) => history.iter().position(|m| m.id == anchor).unwrap_or(0),
            None => history.len(),
        };
        let start = end.saturating_sub(page_size);
        let mut messages = history[start..end].to_vec();
        if data.newest_first {
            messages.reverse();
        }
        Ok(MessagePage {
            messages,
            has_more: start > 0,
        })
    }

    async fn list_messages_around(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        window_size: usize,
    ) -> BackendResult<Vec<Message>> {
        self.calls.lock().list_around.push(message_id);
        let data = self.data.lock();
        let history = data.history.get(&conversation_id).cloned().unwrap_or_default();
        let at = history
            .iter()
            .position(|m| m.id == message_id)
            .ok_or(DomainError::MessageNotFound(message_id))?;
        let start = at.saturating_sub(window_size / 2);
        let end = (start + window_size).min(history.len());
        Ok(history[start..end].to_vec())
    }

    async fn list_thread_replies(&self, parent_id: MessageId) -> BackendResult<Vec<Message>> {
        self.calls.lock().list_replies.push(parent_id);
        Ok(self
            .data
            .lock()
            .replies
            .get(&parent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(&self, message: NewMessage) -> BackendResult<Message> {
        self.calls.lock().sent.push(message.clone());

        let gate = self.send_gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let mut data = self.data.lock();
        if data.fail_sends > 0 {
            data.fail_sends -= 1;
            return Err(Self::backend_error("insert"));
        }

        let author = Author {
            id: message.author_id,
            email: None,
            display_name: None,
        };
        let id = data.next_ids.pop_front().unwrap_or_else(uuid::Uuid::new_v4);
        let mut confirmed = Message::new(
            MessageId::Server(id),
            message.conversation_id,
            author,
            message.body,
            Utc::now(),
        );
        if let Some(file) = message.attachment {
            confirmed = confirmed.with_attachment(FileAttachment::from(file));
        }
        match message.parent_id {
            Some(parent_id) => {
                confirmed = confirmed.in_thread(parent_id);
                data.replies.entry(parent_id).or_default().push(confirmed.clone());
            }
            None => {
                data.history
                    .entry(message.conversation_id)
                    .or_default()
                    .push(confirmed.clone());
            }
        }
        Ok(confirmed)
    }

    async fn mark_read(&self, conversation_id: ConversationId) -> BackendResult<()> {
        self.calls
            .lock()
            .mark_read
            .push((conversation_id, Instant::now()));
        if self.data.lock().fail_mark_read {
            return Err(Self::backend_error("mark read"));
        }
        Ok(())
    }

    async fn update_unread_total(&self, total: u32) -> BackendResult<()> {
        self.calls.lock().unread_pushes.push((total, Instant::now()));
        Ok(())
    }

    async fn list_reactions(
        &self,
        conversation_id: ConversationId,
    ) -> BackendResult<Vec<ReactionRow>> {
        let data = self.data.lock();
        if data.fail_reactions {
            return Err(Self::backend_error("list reactions"));
        }
        Ok(data.reactions.get(&conversation_id).cloned().unwrap_or_default())
    }

    async fn list_pins(&self, conversation_id: ConversationId) -> BackendResult<Vec<PinRow>> {
        Ok(self
            .data
            .lock()
            .pins
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Scriptable [`FileUploader`]
#[derive(Default)]
pub struct FakeUploader {
    failing: Mutex<HashSet<String>>,
    uploaded: Mutex<Vec<String>>,
}

impl FakeUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make uploads of `name` fail
    pub fn fail_file(&self, name: &str) {
        self.failing.lock().insert(name.to_string());
    }

    /// Names of successfully uploaded files, in order
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().clone()
    }
}

#[async_trait]
impl FileUploader for FakeUploader {
    async fn upload(
        &self,
        file: &OutgoingFile,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> BackendResult<UploadedFile> {
        if self.failing.lock().contains(&file.name) {
            return Err(DomainError::Upload(format!("{} rejected", file.name)));
        }
        self.uploaded.lock().push(file.name.clone());
        Ok(UploadedFile {
            url: format!("https://files.test/{user_id}/{conversation_id}/{}", file.name),
            file_name: file.name.clone(),
            file_type: file.mime_type.clone(),
            file_size: file.size(),
        })
    }
}
