//! Read receipt - a user having read a message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ConversationId, MessageId, UserId};

/// Read receipt entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub message_id: MessageId,
    pub user_id: UserId,
    /// Not every feed row carries the conversation
    pub conversation_id: Option<ConversationId>,
    pub read_at: DateTime<Utc>,
}

impl ReadReceipt {
    /// Create a new read receipt stamped now
    pub fn new(message_id: MessageId, user_id: UserId) -> Self {
        Self {
            message_id,
            user_id,
            conversation_id: None,
            read_at: Utc::now(),
        }
    }
}
