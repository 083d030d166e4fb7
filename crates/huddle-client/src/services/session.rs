//! Session service
//!
//! Sign-in, sign-out and user switches. A session owns the cache claim, the
//! realtime subscriptions and the pump task that feeds them to the
//! reconciler; teardown releases all of them at once.

use huddle_cache::Subscription;
use huddle_core::{RealtimeTable, SessionId};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace};

use crate::context::ClientContext;
use crate::error::ClientResult;
use crate::events::ClientEvent;
use crate::state::{CurrentUser, Session, ViewState};

use super::reconciler::Reconciler;

/// Session service
pub struct SessionService<'a> {
    ctx: &'a ClientContext,
}

impl<'a> SessionService<'a> {
    /// Create a new SessionService
    pub fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    /// Start a session for `user`
    ///
    /// Signing in again as the same user keeps the running session. Signing
    /// in as someone else tears the old session down first, so no data of
    /// the previous user survives.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub fn sign_in(&self, user: CurrentUser) -> ClientResult<SessionId> {
        {
            let mut state = self.ctx.lock();
            if let Some(session) = state.session.as_mut() {
                if session.user.id == user.id {
                    session.user = user;
                    debug!(session_id = %session.id, "Already signed in");
                    return Ok(session.id);
                }
            }
        }

        if self.teardown() {
            info!("Previous user signed out for user switch");
        }

        let session_id = SessionId::new_v4();
        self.ctx.cache().claim(session_id)?;

        let messages = self.ctx.feed().subscribe(RealtimeTable::Messages)?;
        let reads = match self.ctx.feed().subscribe(RealtimeTable::MessageReads) {
            Ok(reads) => reads,
            Err(e) => {
                self.ctx.feed().unsubscribe(messages.id);
                self.ctx.cache().invalidate_all();
                return Err(e.into());
            }
        };

        {
            let mut state = self.ctx.lock();
            state.view = ViewState::default();
            state.session = Some(Session {
                id: session_id,
                user,
                subscriptions: vec![messages.id, reads.id],
                pump: None,
            });
        }

        let pump = spawn_pump(self.ctx, session_id, messages, reads);
        if let Some(session) = self.ctx.lock().session.as_mut() {
            session.pump = Some(pump);
        }

        self.ctx.emit(ClientEvent::SessionChanged {
            session_id: Some(session_id),
        });
        info!(session_id = %session_id, "Signed in");
        Ok(session_id)
    }

    /// End the current session; returns `false` if nobody was signed in
    #[instrument(skip(self))]
    pub fn sign_out(&self) -> bool {
        let ended = self.teardown();
        if ended {
            info!("Signed out");
        }
        ended
    }

    /// Release everything the current session holds
    fn teardown(&self) -> bool {
        let session = {
            let mut state = self.ctx.lock();
            let session = state.session.take();
            state.view = ViewState::default();
            session
        };
        let Some(session) = session else {
            return false;
        };

        let cancelled = self.ctx.timers().cancel_all();
        if let Some(pump) = session.pump {
            pump.abort();
        }
        for id in session.subscriptions {
            self.ctx.feed().unsubscribe(id);
        }
        let cleared = self.ctx.cache().invalidate_all();

        self.ctx
            .emit(ClientEvent::SessionChanged { session_id: None });
        debug!(
            session_id = %session.id,
            cancelled,
            cleared,
            "Session torn down"
        );
        true
    }
}

/// Drain both subscriptions into the reconciler until they close
fn spawn_pump(
    ctx: &ClientContext,
    session_id: SessionId,
    messages: Subscription,
    reads: Subscription,
) -> JoinHandle<()> {
    let pump_ctx = ctx.clone();
    ctx.spawn(async move {
        let ctx = pump_ctx;
        let (_, mut messages) = messages.into_parts();
        let (_, mut reads) = reads.into_parts();
        let reconciler = Reconciler::new(&ctx);

        loop {
            let row = tokio::select! {
                Some(row) = messages.recv() => row,
                Some(row) = reads.recv() => row,
                else => break,
            };
            if !ctx.is_current(session_id) {
                break;
            }
            let outcome = reconciler.apply(session_id, &row);
            trace!(outcome = ?outcome, "Pumped realtime row");
        }
        debug!(session_id = %session_id, "Realtime pump stopped");
    })
}
