//! Message entity - a chat message, confirmed or optimistic

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file::FileAttachment;
use crate::value_objects::{ConversationId, MessageId, UserId};

/// Author identity as denormalized onto the message at send time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Author {
    /// Name to show next to the message
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Pin marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMarker {
    pub pinned_by: UserId,
    pub pinned_at: DateTime<Utc>,
}

/// Aggregated reactions of one type on a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub count: u32,
    pub reacted_by_me: bool,
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub author: Author,
    pub body: Option<String>,
    pub attachment: Option<FileAttachment>,
    pub created_at: DateTime<Utc>,
    /// Set on thread replies
    pub parent_id: Option<MessageId>,
    pub thread_reply_count: u32,
    pub read_by: BTreeSet<UserId>,
    pub pin: Option<PinMarker>,
    pub reactions: BTreeMap<String, ReactionSummary>,
}

impl Message {
    /// Create a new top-level message
    pub fn new(
        id: MessageId,
        conversation_id: ConversationId,
        author: Author,
        body: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            author,
            body,
            attachment: None,
            created_at,
            parent_id: None,
            thread_reply_count: 0,
            read_by: BTreeSet::new(),
            pin: None,
            reactions: BTreeMap::new(),
        }
    }

    /// Attach a file
    #[must_use]
    pub fn with_attachment(mut self, attachment: FileAttachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Mark as a reply to `parent_id`
    #[must_use]
    pub fn in_thread(mut self, parent_id: MessageId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Check if this is an optimistic placeholder
    #[inline]
    pub fn is_optimistic(&self) -> bool {
        self.id.is_temp()
    }

    /// Check if message is a thread reply
    #[inline]
    pub fn is_thread_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Check if message was written by `user_id`
    #[inline]
    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author.id == user_id
    }

    /// Add a reader. Returns `true` if the reader set changed.
    pub fn mark_read_by(&mut self, user_id: UserId) -> bool {
        self.read_by.insert(user_id)
    }

    /// Get a truncated preview of the body (for conversation list snapshots)
    pub fn preview(&self, max_len: usize) -> String {
        match (&self.body, &self.attachment) {
            (Some(body), _) => {
                if body.len() <= max_len {
                    body.clone()
                } else {
                    let mut end = max_len;
                    while !body.is_char_boundary(end) && end > 0 {
                        end -= 1;
                    }
                    body[..end].to_string()
                }
            }
            (None, Some(attachment)) => attachment.file_name.clone(),
            (None, None) => String::new(),
        }
    }
}
