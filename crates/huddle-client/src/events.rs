//! Change notifications published to UI callers

use huddle_common::Notice;
use huddle_core::{ConversationId, MessageId, SessionId};
use serde::Serialize;

/// Broadcast buffer for client events
pub const EVENT_BUFFER: usize = 256;

/// Something observable changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Signed in, switched user, or signed out
    SessionChanged { session_id: Option<SessionId> },
    /// Visible message list of `conversation_id` changed
    MessagesChanged { conversation_id: ConversationId },
    /// Conversation list changed (order, last message, unread counts)
    ConversationsChanged,
    /// Aggregate unread total changed
    UnreadTotalChanged { total: u32 },
    /// Reaction, pin or read state of one message changed
    MessageStateChanged { message_id: MessageId },
    /// Open thread changed (opened, closed, or replies updated)
    ThreadChanged { parent_id: Option<MessageId> },
    /// User-facing notice
    Notice(Notice),
}
