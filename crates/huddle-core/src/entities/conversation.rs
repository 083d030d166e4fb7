//! Conversation entity - a channel or a direct message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::value_objects::{ConversationId, MessageId, UserId};

/// Length of the last-message preview kept on the conversation list
pub const LAST_MESSAGE_PREVIEW_LEN: usize = 120;

/// Conversation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    #[default]
    Channel,
    Direct,
}

/// Conversation participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Denormalized snapshot of the newest message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub message_id: MessageId,
    pub author_id: UserId,
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for LastMessage {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id,
            author_id: message.author.id,
            preview: message.preview(LAST_MESSAGE_PREVIEW_LEN),
            created_at: message.created_at,
        }
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub is_private: bool,
    /// Joined flag; only meaningful for public channels
    pub is_member: bool,
    pub participants: Vec<Participant>,
    pub last_message: Option<LastMessage>,
    pub unread_count: u32,
}

impl Conversation {
    /// Create a new channel
    pub fn new_channel(id: ConversationId, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: ConversationKind::Channel,
            name: Some(name.into()),
            is_private: false,
            is_member: true,
            participants: Vec::new(),
            last_message: None,
            unread_count: 0,
        }
    }

    /// Create a new direct conversation
    pub fn new_direct(id: ConversationId, participants: Vec<Participant>) -> Self {
        Self {
            id,
            kind: ConversationKind::Direct,
            name: None,
            is_private: true,
            is_member: true,
            participants,
            last_message: None,
            unread_count: 0,
        }
    }

    /// Check if this is a DM
    #[inline]
    pub fn is_direct(&self) -> bool {
        matches!(self.kind, ConversationKind::Direct)
    }

    /// Display name as seen by `viewer`; DMs are named after the other participant
    pub fn display_name(&self, viewer: UserId) -> &str {
        if let Some(name) = self.name.as_deref() {
            return name;
        }
        if self.is_direct() {
            if let Some(other) = self.participants.iter().find(|p| p.user_id != viewer) {
                if let Some(label) = other.display_name.as_deref().or(other.email.as_deref()) {
                    return label;
                }
            }
            return "Direct Message";
        }
        "Unnamed channel"
    }

    /// Check if `user_id` participates in this conversation
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Timestamp used to order the conversation list
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.created_at)
    }

    /// Record a newer message as the last-message snapshot
    ///
    /// Older messages (e.g. from pagination) leave the snapshot untouched.
    pub fn record_message(&mut self, message: &Message) {
        let newer = self
            .last_message
            .as_ref()
            .is_none_or(|last| message.created_at >= last.created_at);
        if newer {
            self.last_message = Some(LastMessage::from(message));
        }
    }
}

/// Sort conversations by most recent activity; idle ones keep their relative order at the end
pub fn sort_by_activity(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
}
