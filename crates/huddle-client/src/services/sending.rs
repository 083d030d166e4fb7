//! Send service
//!
//! Optimistic send: validate, show a placeholder per message immediately,
//! then upload and insert serially. Each placeholder is either replaced in
//! place by its confirmed message or removed with a notice.

use chrono::Utc;
use huddle_common::Notice;
use huddle_core::{
    ComposedMessage, ConversationId, DomainError, FileAttachment, Message, MessageId,
    NewMessage, OutgoingFile, SessionId, UserId,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::context::ClientContext;
use crate::error::{ClientError, ClientResult};
use crate::events::ClientEvent;
use crate::state::{window, CurrentUser};

use super::conversations::ConversationService;

/// Outcome of one send
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendReport {
    /// Server ids of the confirmed messages, in send order
    pub confirmed: Vec<MessageId>,
    /// Placeholders that were rolled back
    pub failed: usize,
}

impl SendReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// One message of a send: the text, a file, or both
#[derive(Debug)]
struct PlannedMessage {
    temp_id: MessageId,
    body: Option<String>,
    file: Option<OutgoingFile>,
}

/// Where a send lands
#[derive(Debug, Clone, Copy)]
struct Target {
    session_id: SessionId,
    conversation_id: ConversationId,
    parent_id: Option<MessageId>,
}

/// Send service
pub struct SendService<'a> {
    ctx: &'a ClientContext,
}

impl<'a> SendService<'a> {
    /// Create a new SendService
    pub fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    /// Send text and files to the active conversation
    ///
    /// With several files, the text travels with the first one and each file
    /// becomes its own message. Validation failures change nothing. Individual
    /// upload or insert failures roll back only their own placeholder.
    #[instrument(skip(self, text, files), fields(files = files.len()))]
    pub async fn send(
        &self,
        text: &str,
        parent_id: Option<MessageId>,
        files: Vec<OutgoingFile>,
    ) -> ClientResult<SendReport> {
        let (session_id, user) = self.ctx.require_session()?;
        let conversation_id = self
            .ctx
            .lock()
            .view
            .active
            .ok_or(DomainError::NoActiveConversation)?;

        let composed = ComposedMessage {
            text: text.to_string(),
            files,
        };
        self.ctx
            .config()
            .messaging
            .attachment_policy()
            .check(&composed)?;

        let target = Target {
            session_id,
            conversation_id,
            parent_id,
        };
        let plan = self.plan(&composed);
        self.insert_placeholders(target, &user, &plan)?;

        let delay = self.ctx.config().messaging.multi_file_delay();
        let mut report = SendReport::default();
        let mut remaining = plan.into_iter().peekable();

        while let Some(planned) = remaining.next() {
            let temp_id = planned.temp_id;
            match self.deliver(target, user.id, planned).await {
                Ok(confirmed) => {
                    report.confirmed.push(confirmed.id);
                    self.confirm(target, temp_id, confirmed);
                }
                Err(e) => {
                    warn!(temp_id = %temp_id, error = %e, "Send failed, rolling back placeholder");
                    report.failed += 1;
                    self.roll_back(target, temp_id, &e);
                }
            }

            if remaining.peek().is_some() {
                tokio::time::sleep(delay).await;
                if !self.ctx.is_current(session_id) {
                    debug!("Session ended mid-send, abandoning remaining files");
                    report.failed += remaining.count();
                    break;
                }
            }
        }

        info!(
            conversation_id = %conversation_id,
            confirmed = report.confirmed.len(),
            failed = report.failed,
            "Send finished"
        );
        Ok(report)
    }

    fn plan(&self, composed: &ComposedMessage) -> Vec<PlannedMessage> {
        let mut body = composed.trimmed_text().map(str::to_string);

        if composed.files.is_empty() {
            return vec![PlannedMessage {
                temp_id: self.ctx.temp_ids().generate(),
                body,
                file: None,
            }];
        }

        composed
            .files
            .iter()
            .map(|file| PlannedMessage {
                temp_id: self.ctx.temp_ids().generate(),
                body: body.take(),
                file: Some(file.clone()),
            })
            .collect()
    }

    fn placeholder(&self, target: Target, user: &CurrentUser, planned: &PlannedMessage) -> Message {
        let mut message = Message::new(
            planned.temp_id,
            target.conversation_id,
            user.author(),
            planned.body.clone(),
            Utc::now(),
        );
        if let Some(file) = &planned.file {
            message = message.with_attachment(FileAttachment::preview(file));
        }
        if let Some(parent_id) = target.parent_id {
            message = message.in_thread(parent_id);
        }
        message
    }

    /// Show every placeholder before the first network call
    fn insert_placeholders(
        &self,
        target: Target,
        user: &CurrentUser,
        plan: &[PlannedMessage],
    ) -> ClientResult<()> {
        let placeholders: Vec<Message> = plan
            .iter()
            .map(|planned| self.placeholder(target, user, planned))
            .collect();

        let mut state = self.ctx.lock();
        if !state.is_current(target.session_id) {
            return Err(ClientError::Stale);
        }

        match target.parent_id {
            Some(parent_id) => {
                if let Some(thread) = state.view.thread_for(parent_id) {
                    for placeholder in placeholders {
                        window::insert_sorted(&mut thread.replies, placeholder);
                    }
                    self.ctx.emit(ClientEvent::ThreadChanged {
                        parent_id: Some(parent_id),
                    });
                }
            }
            None => {
                let conversation_id = target.conversation_id;
                self.ctx
                    .cache()
                    .update_messages(target.session_id, conversation_id, |messages| {
                        for placeholder in &placeholders {
                            window::insert_sorted(messages, placeholder.clone());
                        }
                    })?;
                if state.view.is_active(conversation_id) {
                    for placeholder in placeholders {
                        window::insert_sorted(&mut state.view.messages, placeholder);
                    }
                    self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
                }
            }
        }
        Ok(())
    }

    /// Upload (if any) then insert one message
    async fn deliver(
        &self,
        target: Target,
        author_id: UserId,
        planned: PlannedMessage,
    ) -> ClientResult<Message> {
        let attachment = match &planned.file {
            Some(file) => Some(
                self.ctx
                    .uploader()
                    .upload(file, author_id, target.conversation_id)
                    .await?,
            ),
            None => None,
        };

        let confirmed = self
            .ctx
            .backend()
            .send_message(NewMessage {
                conversation_id: target.conversation_id,
                author_id,
                body: planned.body,
                parent_id: target.parent_id,
                attachment,
            })
            .await?;
        Ok(confirmed)
    }

    fn confirm(&self, target: Target, temp_id: MessageId, confirmed: Message) {
        let mut state = self.ctx.lock();
        if !state.is_current(target.session_id) {
            return;
        }

        if let Some(parent_id) = target.parent_id {
            if let Some(thread) = state.view.thread_for(parent_id) {
                window::confirm(&mut thread.replies, temp_id, confirmed);
                self.ctx.emit(ClientEvent::ThreadChanged {
                    parent_id: Some(parent_id),
                });
            }
            return;
        }

        let conversation_id = target.conversation_id;
        if let Err(e) = self
            .ctx
            .cache()
            .update_messages(target.session_id, conversation_id, |messages| {
                window::confirm(messages, temp_id, confirmed.clone())
            })
        {
            warn!(error = %e, "Cache refused confirmed message");
        }
        if state.view.is_active(conversation_id) {
            window::confirm(&mut state.view.messages, temp_id, confirmed.clone());
            self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
        }
        if let Some(conversation) = state.view.conversation_mut(conversation_id) {
            conversation.record_message(&confirmed);
        }
        ConversationService::new(self.ctx).conversations_changed(target.session_id, &mut state.view);
        debug!(temp_id = %temp_id, message_id = %confirmed.id, "Placeholder confirmed");
    }

    fn roll_back(&self, target: Target, temp_id: MessageId, err: &ClientError) {
        {
            let mut state = self.ctx.lock();
            if !state.is_current(target.session_id) {
                return;
            }

            match target.parent_id {
                Some(parent_id) => {
                    if let Some(thread) = state.view.thread_for(parent_id) {
                        window::remove(&mut thread.replies, temp_id);
                        self.ctx.emit(ClientEvent::ThreadChanged {
                            parent_id: Some(parent_id),
                        });
                    }
                }
                None => {
                    let conversation_id = target.conversation_id;
                    if let Err(e) = self.ctx.cache().update_messages(
                        target.session_id,
                        conversation_id,
                        |messages| window::remove(messages, temp_id),
                    ) {
                        warn!(error = %e, "Cache refused rollback");
                    }
                    if window::remove(&mut state.view.messages, temp_id).is_some() {
                        self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
                    }
                }
            }
        }

        self.ctx
            .notify(Notice::toast("SEND_FAILED", format!("Message not sent: {err}")));
    }
}
