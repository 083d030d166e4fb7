//! `ChatBackend` over the hosted query API

use async_trait::async_trait;
use huddle_common::BackendConfig;
use huddle_core::events::{convert_rows, ConversationRow, MessageRow, PinRow, ReactionRow};
use huddle_core::{
    BackendResult, ChatBackend, Conversation, ConversationId, DomainError, Message, MessageId,
    MessagePage, NewMessage,
};
use reqwest::Method;

use super::dto::{MessagePageResponse, SendMessageRequest, UnreadTotalRequest};
use super::routes;
use crate::http::HttpClient;

/// Query API adapter
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: HttpClient,
}

impl RestBackend {
    /// Create a backend from configuration
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        Ok(Self {
            http: HttpClient::from_config(config)?,
        })
    }

    /// Create a backend sharing an existing HTTP client
    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    fn messages_from_rows(rows: Vec<MessageRow>, context: &'static str) -> Vec<Message> {
        let (messages, rejected): (Vec<Message>, _) = convert_rows(rows);
        log_rejected(context, &rejected);
        messages
    }
}

fn log_rejected(context: &'static str, rejected: &[DomainError]) {
    for err in rejected {
        tracing::warn!(context, error = %err, "Skipping malformed backend row");
    }
}

fn server_anchor(id: MessageId) -> BackendResult<uuid::Uuid> {
    id.server_id().ok_or_else(|| {
        DomainError::ValidationError(format!("{id} has not been assigned a server id"))
    })
}

#[async_trait]
impl ChatBackend for RestBackend {
    async fn list_conversations(&self) -> BackendResult<Vec<Conversation>> {
        let request = self.http.request(Method::GET, &routes::conversations());
        let rows: Vec<ConversationRow> = self.http.send_json(request).await?;

        let (conversations, rejected): (Vec<Conversation>, _) = convert_rows(rows);
        log_rejected("list_conversations", &rejected);
        Ok(conversations)
    }

    async fn list_messages(
        &self,
        conversation_id: ConversationId,
        before: Option<MessageId>,
        page_size: usize,
    ) -> BackendResult<MessagePage> {
        let mut query = vec![("limit", page_size.to_string())];
        if let Some(anchor) = before {
            query.push(("before", server_anchor(anchor)?.to_string()));
        }

        let request = self
            .http
            .request(Method::GET, &routes::messages(conversation_id))
            .query(&query);
        let page: MessagePageResponse = self.http.send_json(request).await?;

        Ok(MessagePage {
            messages: Self::messages_from_rows(page.messages, "list_messages"),
            has_more: page.has_more,
        })
    }

    async fn list_messages_around(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        window_size: usize,
    ) -> BackendResult<Vec<Message>> {
        server_anchor(message_id)?;
        let request = self
            .http
            .request(
                Method::GET,
                &routes::messages_around(conversation_id, message_id),
            )
            .query(&[("window", window_size)]);
        let rows: Vec<MessageRow> = self.http.send_json(request).await.map_err(|e| {
            if e.is_not_found() {
                DomainError::MessageNotFound(message_id)
            } else {
                e.into()
            }
        })?;

        Ok(Self::messages_from_rows(rows, "list_messages_around"))
    }

    async fn list_thread_replies(&self, parent_id: MessageId) -> BackendResult<Vec<Message>> {
        server_anchor(parent_id)?;
        let request = self
            .http
            .request(Method::GET, &routes::thread_replies(parent_id));
        let rows: Vec<MessageRow> = self.http.send_json(request).await?;

        Ok(Self::messages_from_rows(rows, "list_thread_replies"))
    }

    async fn send_message(&self, message: NewMessage) -> BackendResult<Message> {
        let body = SendMessageRequest::from(&message);
        let request = self
            .http
            .request(Method::POST, &routes::messages(message.conversation_id))
            .json(&body);
        let row: MessageRow = self.http.send_json(request).await?;

        let sent = Message::try_from(row)?;
        tracing::debug!(
            message_id = %sent.id,
            conversation_id = %sent.conversation_id,
            "Message inserted"
        );
        Ok(sent)
    }

    async fn mark_read(&self, conversation_id: ConversationId) -> BackendResult<()> {
        let request = self
            .http
            .request(Method::POST, &routes::mark_read(conversation_id));
        self.http.send_empty(request).await?;
        Ok(())
    }

    async fn update_unread_total(&self, total: u32) -> BackendResult<()> {
        let request = self
            .http
            .request(Method::PUT, &routes::unread_total())
            .json(&UnreadTotalRequest {
                unread_count: total,
            });
        self.http.send_empty(request).await?;
        Ok(())
    }

    async fn list_reactions(
        &self,
        conversation_id: ConversationId,
    ) -> BackendResult<Vec<ReactionRow>> {
        let request = self
            .http
            .request(Method::GET, &routes::reactions(conversation_id));
        Ok(self.http.send_json(request).await?)
    }

    async fn list_pins(&self, conversation_id: ConversationId) -> BackendResult<Vec<PinRow>> {
        let request = self.http.request(Method::GET, &routes::pins(conversation_id));
        Ok(self.http.send_json(request).await?)
    }
}
