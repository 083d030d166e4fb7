//! Backend ports - the hosted query API and storage service
//!
//! The client core only ever talks to the backend through these traits. The
//! transport and wire format are the adapter's concern.

use async_trait::async_trait;

use crate::entities::{Conversation, Message, OutgoingFile, UploadedFile};
use crate::error::DomainError;
use crate::events::{PinRow, ReactionRow};
use crate::value_objects::{ConversationId, MessageId, UserId};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, DomainError>;

/// One page of messages
///
/// Order within the page is whatever the backend returns; callers sort by
/// `created_at` before merging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

/// Message insert request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub author_id: UserId,
    pub body: Option<String>,
    pub parent_id: Option<MessageId>,
    pub attachment: Option<UploadedFile>,
}

// ============================================================================
// Query API
// ============================================================================

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// List conversations visible to the signed-in user
    async fn list_conversations(&self) -> BackendResult<Vec<Conversation>>;

    /// List the newest `page_size` top-level messages strictly older than
    /// `before`, or the latest page without an anchor
    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        before: Option<MessageId>,
        page_size: usize,
    ) -> BackendResult<MessagePage>;

    /// List a window of top-level messages centered on `message_id`
    async fn list_messages_around(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        window_size: usize,
    ) -> BackendResult<Vec<Message>>;

    /// List replies to a thread parent, oldest first
    async fn list_thread_replies(&self, parent_id: MessageId) -> BackendResult<Vec<Message>>;

    /// Insert a message; returns the authoritative row
    async fn send_message(&self, message: NewMessage) -> BackendResult<Message>;

    /// Mark a conversation as read for the signed-in user
    async fn mark_read(&self, conversation_id: ConversationId) -> BackendResult<()>;

    /// Push the aggregate unread count (notification badge)
    async fn update_unread_total(&self, total: u32) -> BackendResult<()>;

    /// Raw reaction rows for a conversation's messages
    async fn list_reactions(&self, conversation_id: ConversationId)
        -> BackendResult<Vec<ReactionRow>>;

    /// Pinned-message rows for a conversation
    async fn list_pins(&self, conversation_id: ConversationId) -> BackendResult<Vec<PinRow>>;
}

// ============================================================================
// Storage
// ============================================================================

#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Upload a file into the conversation's storage area
    async fn upload(
        &self,
        file: &OutgoingFile,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> BackendResult<UploadedFile>;
}
