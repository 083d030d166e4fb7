//! Client context - dependency container for services
//!
//! Holds the backend ports, the realtime feed, the shared conversation cache,
//! configuration, and the mutable client state.

use std::sync::Arc;

use huddle_cache::{ConversationCache, RealtimeFeed};
use huddle_common::{ClientConfig, Notice};
use huddle_core::{ChatBackend, FileUploader, SessionId, TempIdGenerator};
use parking_lot::{Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::{ClientError, ClientResult};
use crate::events::{ClientEvent, EVENT_BUFFER};
use crate::state::{ClientState, CurrentUser};
use crate::timing::{Debouncer, TimerKey};

/// Client context containing all dependencies
///
/// Cloning is cheap; every clone shares the same state, cache and timers.
#[derive(Clone)]
pub struct ClientContext {
    // Backend ports
    backend: Arc<dyn ChatBackend>,
    uploader: Arc<dyn FileUploader>,
    feed: Arc<dyn RealtimeFeed>,

    // Shared cache
    cache: Arc<ConversationCache>,

    config: Arc<ClientConfig>,
    temp_ids: Arc<TempIdGenerator>,

    // Background tasks run here
    runtime: Handle,

    // Mutable state
    state: Arc<Mutex<ClientState>>,
    events: broadcast::Sender<ClientEvent>,
    timers: Arc<Debouncer<TimerKey>>,
}

impl ClientContext {
    /// Create a new client context
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        uploader: Arc<dyn FileUploader>,
        feed: Arc<dyn RealtimeFeed>,
        cache: Arc<ConversationCache>,
        config: ClientConfig,
        runtime: Handle,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            backend,
            uploader,
            feed,
            cache,
            config: Arc::new(config),
            temp_ids: Arc::new(TempIdGenerator::new()),
            state: Arc::new(Mutex::new(ClientState::default())),
            events,
            timers: Arc::new(Debouncer::with_runtime(runtime.clone())),
            runtime,
        }
    }

    // === Ports ===

    pub fn backend(&self) -> &dyn ChatBackend {
        self.backend.as_ref()
    }

    pub fn uploader(&self) -> &dyn FileUploader {
        self.uploader.as_ref()
    }

    pub fn feed(&self) -> &dyn RealtimeFeed {
        self.feed.as_ref()
    }

    pub fn cache(&self) -> &ConversationCache {
        self.cache.as_ref()
    }

    pub fn config(&self) -> &ClientConfig {
        self.config.as_ref()
    }

    pub fn temp_ids(&self) -> &TempIdGenerator {
        self.temp_ids.as_ref()
    }

    pub(crate) fn timers(&self) -> &Debouncer<TimerKey> {
        self.timers.as_ref()
    }

    /// Spawn a background task on the client's runtime
    pub(crate) fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task)
    }

    // === State ===

    pub(crate) fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock()
    }

    /// Current session id, if signed in
    pub fn session_id(&self) -> Option<SessionId> {
        self.lock().session_id()
    }

    /// Current session and user, or `NotSignedIn`
    pub(crate) fn require_session(&self) -> ClientResult<(SessionId, CurrentUser)> {
        let state = self.lock();
        state
            .session
            .as_ref()
            .map(|s| (s.id, s.user.clone()))
            .ok_or(ClientError::Domain(huddle_core::DomainError::NotSignedIn))
    }

    /// Check that `session_id` is still the live session
    pub fn is_current(&self, session_id: SessionId) -> bool {
        self.lock().is_current(session_id)
    }

    // === Events ===

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    pub(crate) fn notify(&self, notice: Notice) {
        tracing::debug!(code = %notice.code, message = %notice.message, "Raising notice");
        self.emit(ClientEvent::Notice(notice));
    }

    /// Surface `err` as a notice unless it only reflects a session change
    pub(crate) fn report(&self, err: &ClientError) {
        if err.is_stale_for(self.session_id()) {
            tracing::debug!(error = %err, "Dropping stale result");
            return;
        }
        self.notify(err.notice());
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("backend", &"dyn ChatBackend")
            .field("uploader", &"dyn FileUploader")
            .field("feed", &"dyn RealtimeFeed")
            .field("cache", &self.cache)
            .field("timers", &self.timers.pending_count())
            .finish()
    }
}

/// Builder for creating a ClientContext
#[derive(Default)]
pub struct ClientContextBuilder {
    backend: Option<Arc<dyn ChatBackend>>,
    uploader: Option<Arc<dyn FileUploader>>,
    feed: Option<Arc<dyn RealtimeFeed>>,
    cache: Option<Arc<ConversationCache>>,
    config: Option<ClientConfig>,
    runtime: Option<Handle>,
}

impl ClientContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn uploader(mut self, uploader: Arc<dyn FileUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    #[must_use]
    pub fn feed(mut self, feed: Arc<dyn RealtimeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Share an existing cache (a fresh one is created otherwise)
    #[must_use]
    pub fn cache(mut self, cache: Arc<ConversationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Runtime for timers and the realtime pump (the current one otherwise)
    #[must_use]
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Build the ClientContext
    ///
    /// # Errors
    /// Returns `ClientError::MissingDependency` if a port is missing, or if
    /// no runtime was given and none is current
    pub fn build(self) -> ClientResult<ClientContext> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current()
                .map_err(|_| ClientError::MissingDependency("tokio runtime"))?,
        };
        Ok(ClientContext::new(
            self.backend
                .ok_or(ClientError::MissingDependency("backend"))?,
            self.uploader
                .ok_or(ClientError::MissingDependency("uploader"))?,
            self.feed.ok_or(ClientError::MissingDependency("feed"))?,
            self.cache.unwrap_or_else(ConversationCache::new_shared),
            self.config.unwrap_or_default(),
            runtime,
        ))
    }
}
