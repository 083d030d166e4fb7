//! Read state service
//!
//! Coalesces mark-as-read requests per conversation and pushes the unread
//! total to the backend after it settles.

use huddle_core::{ConversationId, SessionId};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::context::ClientContext;
use crate::events::ClientEvent;
use crate::state::ViewState;
use crate::timing::TimerKey;

/// Read state service
pub struct ReadStateService<'a> {
    ctx: &'a ClientContext,
}

impl<'a> ReadStateService<'a> {
    /// Create a new ReadStateService
    pub fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    /// Request that `conversation_id` be marked read
    ///
    /// Dropped while a successful call for the same conversation is younger
    /// than the minimum interval; otherwise (re)starts the debounce timer.
    /// Returns `true` if a call was scheduled.
    pub fn mark_as_read(&self, session_id: SessionId, conversation_id: ConversationId) -> bool {
        {
            let state = self.ctx.lock();
            if !state.is_current(session_id) {
                return false;
            }
            if self.marked_recently(&state.view, conversation_id) {
                debug!(conversation_id = %conversation_id, "Mark-as-read dropped, marked recently");
                return false;
            }
        }

        let ctx = self.ctx.clone();
        self.ctx.timers().schedule(
            TimerKey::MarkRead(conversation_id),
            self.ctx.config().timing.read_debounce(),
            async move {
                ReadStateService::new(&ctx).fire_mark_read(session_id, conversation_id);
            },
        );
        true
    }

    /// Debounce elapsed: issue the backend call
    ///
    /// The call runs detached so a later debounce restart cannot abort it
    /// halfway.
    fn fire_mark_read(&self, session_id: SessionId, conversation_id: ConversationId) {
        {
            let state = self.ctx.lock();
            if !state.is_current(session_id) || self.marked_recently(&state.view, conversation_id)
            {
                return;
            }
        }

        let ctx = self.ctx.clone();
        self.ctx.spawn(async move {
            match ctx.backend().mark_read(conversation_id).await {
                Ok(()) => {
                    let mut state = ctx.lock();
                    if state.is_current(session_id) {
                        state
                            .view
                            .last_read_success
                            .insert(conversation_id, Instant::now());
                    }
                    debug!(conversation_id = %conversation_id, "Conversation marked read");
                }
                Err(e) => {
                    warn!(conversation_id = %conversation_id, error = %e, "Mark-as-read failed");
                }
            }
        });
    }

    fn marked_recently(&self, view: &ViewState, conversation_id: ConversationId) -> bool {
        let min_interval = self.ctx.config().timing.read_min_interval();
        view.last_read_success
            .get(&conversation_id)
            .is_some_and(|at| at.elapsed() < min_interval)
    }

    /// Recompute the unread total and schedule a push if it moved
    ///
    /// Called with the state lock held, after any change to per-conversation
    /// unread counts.
    pub(crate) fn sync_unread(&self, session_id: SessionId, view: &mut ViewState) {
        let total = view.compute_unread_total();
        if total != view.unread_total {
            view.unread_total = total;
            self.ctx.emit(ClientEvent::UnreadTotalChanged { total });
        }

        if view.last_pushed_unread == Some(total) {
            self.ctx.timers().cancel(TimerKey::UnreadPush);
            return;
        }

        let ctx = self.ctx.clone();
        self.ctx.timers().schedule(
            TimerKey::UnreadPush,
            self.ctx.config().timing.unread_push_debounce(),
            async move {
                ReadStateService::new(&ctx).push_unread(session_id).await;
            },
        );
    }

    async fn push_unread(&self, session_id: SessionId) {
        let total = {
            let state = self.ctx.lock();
            if !state.is_current(session_id) {
                return;
            }
            let total = state.view.unread_total;
            if state.view.last_pushed_unread == Some(total) {
                return;
            }
            total
        };

        match self.ctx.backend().update_unread_total(total).await {
            Ok(()) => {
                let mut state = self.ctx.lock();
                if state.is_current(session_id) {
                    state.view.last_pushed_unread = Some(total);
                }
                debug!(total, "Unread total pushed");
            }
            Err(e) => warn!(total, error = %e, "Unread total push failed"),
        }
    }
}
