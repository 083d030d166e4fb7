//! Realtime reconciler
//!
//! Applies "row inserted" notifications from the feed to the cache and the
//! visible state. Runs synchronously under the state lock; anything that
//! needs the network (discovery, mark-as-read) is handed off to timers.

use huddle_core::{
    ConversationId, Message, MessageId, ReadReceipt, RealtimeEvent, RowInserted, SessionId,
    UserId,
};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::context::ClientContext;
use crate::events::ClientEvent;
use crate::state::{window, ClientState};

use super::conversations::ConversationService;
use super::read_state::ReadStateService;

/// What applying one notification did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Message inserted into at least one window
    Inserted,
    /// Conversation metadata (last message, counts) updated only
    Recorded,
    /// Read receipt applied to loaded copies
    ReceiptApplied,
    /// Already seen
    Duplicate,
    /// Conversation unknown; discovery started
    Discovering,
    /// Nothing loaded matched
    NoMatch,
    /// Session no longer current
    Ignored,
    /// Row failed validation
    Rejected,
}

/// Realtime reconciler
pub struct Reconciler<'a> {
    ctx: &'a ClientContext,
}

impl<'a> Reconciler<'a> {
    /// Create a new Reconciler
    pub fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    /// Apply one notification for `session_id`
    pub fn apply(&self, session_id: SessionId, row: &RowInserted) -> ReconcileOutcome {
        let event = match RealtimeEvent::decode(row) {
            Ok(event) => event,
            Err(e) => {
                warn!(table = %row.table, error = %e, "Rejected realtime row");
                return ReconcileOutcome::Rejected;
            }
        };

        let outcome = match event {
            RealtimeEvent::MessageInserted(message) => self.apply_message(session_id, message),
            RealtimeEvent::ReadReceiptInserted(receipt) => self.apply_receipt(session_id, &receipt),
        };
        trace!(table = %row.table, outcome = ?outcome, "Realtime row applied");
        outcome
    }

    fn apply_message(&self, session_id: SessionId, message: Message) -> ReconcileOutcome {
        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return ReconcileOutcome::Ignored;
        }
        let Some(me) = state.user().map(|u| u.id) else {
            return ReconcileOutcome::Ignored;
        };
        if !state.view.seen.insert(message.id) {
            debug!(message_id = %message.id, "Duplicate realtime delivery");
            return ReconcileOutcome::Duplicate;
        }

        let conversation_id = message.conversation_id;
        if !state.view.knows_conversation(conversation_id) {
            drop(state);
            ConversationService::new(self.ctx).spawn_discovery(session_id, conversation_id);
            return ReconcileOutcome::Discovering;
        }

        if let Some(parent_id) = message.parent_id {
            return self.apply_reply(session_id, &mut state, message, parent_id, me);
        }

        if message.is_authored_by(me) {
            // Our own echo: the send path owns the window entry
            if let Some(conversation) = state.view.conversation_mut(conversation_id) {
                conversation.record_message(&message);
            }
            ConversationService::new(self.ctx).conversations_changed(session_id, &mut state.view);
            return ReconcileOutcome::Recorded;
        }

        let active = state.view.is_active(conversation_id);
        let inserted = self.insert_top_level(session_id, &mut state, &message, active);

        if let Some(conversation) = state.view.conversation_mut(conversation_id) {
            conversation.record_message(&message);
            if active {
                conversation.unread_count = 0;
            } else {
                conversation.unread_count += 1;
            }
        }
        ConversationService::new(self.ctx).conversations_changed(session_id, &mut state.view);
        drop(state);

        if active {
            ReadStateService::new(self.ctx).mark_as_read(session_id, conversation_id);
        }
        if inserted {
            ReconcileOutcome::Inserted
        } else {
            ReconcileOutcome::Recorded
        }
    }

    fn insert_top_level(
        &self,
        session_id: SessionId,
        state: &mut ClientState,
        message: &Message,
        active: bool,
    ) -> bool {
        let conversation_id = message.conversation_id;
        let cached = match self.ctx.cache().update_messages(session_id, conversation_id, |messages| {
            window::insert_sorted(messages, message.clone())
        }) {
            Ok(Some(inserted)) => inserted,
            Ok(None) => {
                trace!(conversation_id = %conversation_id, "No cached window to update");
                false
            }
            Err(e) => {
                warn!(error = %e, "Cache refused realtime message");
                false
            }
        };

        let visible = active && window::insert_sorted(&mut state.view.messages, message.clone());
        if visible {
            self.ctx.emit(ClientEvent::MessagesChanged { conversation_id });
        }
        cached || visible
    }

    /// Thread replies bump the parent's count and never touch unread state
    fn apply_reply(
        &self,
        session_id: SessionId,
        state: &mut ClientState,
        reply: Message,
        parent_id: MessageId,
        me: UserId,
    ) -> ReconcileOutcome {
        let conversation_id = reply.conversation_id;
        self.bump_parent(session_id, state, conversation_id, parent_id);

        let Some(thread) = state.view.thread_for(parent_id) else {
            return ReconcileOutcome::Recorded;
        };
        thread.parent.thread_reply_count += 1;

        // Own replies arrive through the send path; inserting the echo too
        // would show the reply twice
        let inserted = !reply.is_authored_by(me) && window::insert_sorted(&mut thread.replies, reply);
        self.ctx.emit(ClientEvent::ThreadChanged {
            parent_id: Some(parent_id),
        });

        if inserted {
            ReconcileOutcome::Inserted
        } else {
            ReconcileOutcome::Recorded
        }
    }

    fn bump_parent(
        &self,
        session_id: SessionId,
        state: &mut ClientState,
        conversation_id: ConversationId,
        parent_id: MessageId,
    ) {
        if let Err(e) = self.ctx.cache().update_messages(session_id, conversation_id, |messages| {
            window::bump_reply_count(messages, parent_id)
        }) {
            warn!(error = %e, "Cache refused reply count update");
        }

        if state.view.is_active(conversation_id)
            && window::bump_reply_count(&mut state.view.messages, parent_id)
        {
            self.ctx.emit(ClientEvent::MessageStateChanged {
                message_id: parent_id,
            });
        }
    }

    fn apply_receipt(&self, session_id: SessionId, receipt: &ReadReceipt) -> ReconcileOutcome {
        let mut state = self.ctx.lock();
        if !state.is_current(session_id) {
            return ReconcileOutcome::Ignored;
        }

        let message_id = receipt.message_id;
        let reader = receipt.user_id;
        let mut changed = window::mark_read(&mut state.view.messages, message_id, reader);

        let cached = match receipt.conversation_id {
            Some(conversation_id) => self
                .ctx
                .cache()
                .update_messages(session_id, conversation_id, |messages| {
                    window::mark_read(messages, message_id, reader)
                })
                .map(|updated| updated.unwrap_or(false)),
            None => {
                let mut any = false;
                self.ctx
                    .cache()
                    .update_all_messages(session_id, |_, messages| {
                        any |= window::mark_read(messages, message_id, reader);
                    })
                    .map(|()| any)
            }
        };
        match cached {
            Ok(updated) => changed |= updated,
            Err(e) => warn!(error = %e, "Cache refused read receipt"),
        }

        if let Some(thread) = state.view.thread.as_mut() {
            if thread.parent.id == message_id {
                changed |= thread.parent.mark_read_by(reader);
            }
            changed |= window::mark_read(&mut thread.replies, message_id, reader);
        }

        if changed {
            self.ctx.emit(ClientEvent::MessageStateChanged { message_id });
            ReconcileOutcome::ReceiptApplied
        } else {
            ReconcileOutcome::NoMatch
        }
    }
}
