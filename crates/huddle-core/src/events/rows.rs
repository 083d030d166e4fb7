//! Backend row shapes
//!
//! Rows arrive as loosely-typed JSON from both the query API and the realtime
//! feed. They are decoded into these structs first and then converted into
//! entities, rejecting rows that deserialize but make no sense.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{
    Author, Conversation, ConversationKind, FileAttachment, LastMessage, Message, Participant,
    PinMarker, ReadReceipt,
};
use crate::error::DomainError;
use crate::value_objects::{ConversationId, MessageId, UserId};

/// `messages` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub read_by: Vec<Uuid>,
    #[serde(default)]
    pub pinned_by: Option<Uuid>,
    #[serde(default)]
    pub pinned_at: Option<DateTime<Utc>>,
}

impl TryFrom<MessageRow> for Message {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let attachment = match (row.file_url, row.file_name) {
            (Some(url), Some(file_name)) => Some(FileAttachment {
                url,
                file_name,
                file_type: row
                    .file_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                file_size: row.file_size.unwrap_or(0),
                local_preview: false,
            }),
            (None, None) => None,
            _ => {
                return Err(DomainError::MalformedRow(format!(
                    "message {} has a partial file attachment",
                    row.id
                )))
            }
        };

        let body = row.content.filter(|c| !c.trim().is_empty());
        if body.is_none() && attachment.is_none() {
            return Err(DomainError::MalformedRow(format!(
                "message {} has neither content nor file",
                row.id
            )));
        }

        let pin = match (row.pinned_by, row.pinned_at) {
            (Some(by), Some(at)) => Some(PinMarker {
                pinned_by: UserId::from(by),
                pinned_at: at,
            }),
            _ => None,
        };

        Ok(Message {
            id: MessageId::Server(row.id),
            conversation_id: ConversationId::from(row.conversation_id),
            author: Author {
                id: UserId::from(row.user_id),
                email: row.user_email,
                display_name: row.user_name,
            },
            body,
            attachment,
            created_at: row.created_at,
            parent_id: row.parent_id.map(MessageId::Server),
            thread_reply_count: row.reply_count,
            read_by: row.read_by.into_iter().map(UserId::from).collect(),
            pin,
            reactions: std::collections::BTreeMap::new(),
        })
    }
}

/// `message_reads` table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReadRow {
    pub message_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default = "Utc::now")]
    pub read_at: DateTime<Utc>,
}

impl From<MessageReadRow> for ReadReceipt {
    fn from(row: MessageReadRow) -> Self {
        Self {
            message_id: MessageId::Server(row.message_id),
            user_id: UserId::from(row.user_id),
            conversation_id: row.conversation_id.map(ConversationId::from),
            read_at: row.read_at,
        }
    }
}

/// Participant as embedded in a conversation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRow {
    pub user_id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Last-message snapshot as embedded in a conversation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessageRow {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

/// Conversation row as returned by the conversation-list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRow {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default = "default_true")]
    pub is_member: bool,
    #[serde(default)]
    pub participants: Vec<ParticipantRow>,
    #[serde(default)]
    pub last_message: Option<LastMessageRow>,
    #[serde(default)]
    pub unread_count: u32,
}

fn default_true() -> bool {
    true
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DomainError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        let kind = match row.kind.as_str() {
            "channel" => ConversationKind::Channel,
            "direct" | "dm" => ConversationKind::Direct,
            other => {
                return Err(DomainError::MalformedRow(format!(
                    "conversation {} has unknown type {other}",
                    row.id
                )))
            }
        };

        Ok(Conversation {
            id: ConversationId::from(row.id),
            kind,
            name: row.name,
            is_private: row.is_private,
            is_member: row.is_member,
            participants: row
                .participants
                .into_iter()
                .map(|p| Participant {
                    user_id: UserId::from(p.user_id),
                    email: p.email,
                    display_name: p.display_name,
                })
                .collect(),
            last_message: row.last_message.map(|m| LastMessage {
                message_id: MessageId::Server(m.id),
                author_id: UserId::from(m.user_id),
                preview: m.preview,
                created_at: m.created_at,
            }),
            unread_count: row.unread_count,
        })
    }
}

/// `message_reactions` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRow {
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub reaction_type: String,
}

/// `pinned_messages` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRow {
    pub message_id: Uuid,
    pub pinned_by: Uuid,
    pub pinned_at: DateTime<Utc>,
}

/// Convert a batch of rows, skipping (and reporting) malformed ones
pub fn convert_rows<R, T>(rows: Vec<R>) -> (Vec<T>, Vec<DomainError>)
where
    T: TryFrom<R, Error = DomainError>,
{
    let mut converted = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        match T::try_from(row) {
            Ok(item) => converted.push(item),
            Err(e) => rejected.push(e),
        }
    }
    (converted, rejected)
}
