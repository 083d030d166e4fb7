//! Query API paths

use huddle_core::{ConversationId, MessageId};

pub fn conversations() -> String {
    "/conversations".to_string()
}

pub fn messages(conversation_id: ConversationId) -> String {
    format!("/conversations/{conversation_id}/messages")
}

pub fn messages_around(conversation_id: ConversationId, message_id: MessageId) -> String {
    format!("/conversations/{conversation_id}/messages/around/{message_id}")
}

pub fn thread_replies(parent_id: MessageId) -> String {
    format!("/messages/{parent_id}/replies")
}

pub fn mark_read(conversation_id: ConversationId) -> String {
    format!("/conversations/{conversation_id}/read")
}

pub fn unread_total() -> String {
    "/notifications/unread".to_string()
}

pub fn reactions(conversation_id: ConversationId) -> String {
    format!("/conversations/{conversation_id}/reactions")
}

pub fn pins(conversation_id: ConversationId) -> String {
    format!("/conversations/{conversation_id}/pins")
}
