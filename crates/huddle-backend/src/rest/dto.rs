//! Request and response bodies of the query API

use huddle_core::events::MessageRow;
use huddle_core::NewMessage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `GET /conversations/{id}/messages` response
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePageResponse {
    pub messages: Vec<MessageRow>,
    #[serde(default)]
    pub has_more: bool,
}

/// `POST /conversations/{id}/messages` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl From<&NewMessage> for SendMessageRequest {
    fn from(message: &NewMessage) -> Self {
        let file = message.attachment.as_ref();
        Self {
            user_id: message.author_id.into_inner(),
            content: message.body.clone(),
            parent_id: message.parent_id.and_then(|id| id.server_id()),
            file_url: file.map(|f| f.url.clone()),
            file_name: file.map(|f| f.file_name.clone()),
            file_type: file.map(|f| f.file_type.clone()),
            file_size: file.map(|f| f.file_size),
        }
    }
}

/// `PUT /notifications/unread` body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadTotalRequest {
    pub unread_count: u32,
}
