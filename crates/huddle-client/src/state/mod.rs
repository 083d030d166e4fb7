//! Client state
//!
//! Everything the client mutates lives in one [`ClientState`] behind a
//! mutex owned by the context. The lock is only ever taken between awaits.

mod recent;
pub mod window;

use std::collections::{HashMap, HashSet};

use huddle_cache::SubscriptionId;
use huddle_core::{Author, Conversation, ConversationId, Message, MessageId, SessionId, UserId};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub use recent::{RecentIds, RECENT_CAPACITY};

/// Locally known profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl CurrentUser {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            email: None,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Author snapshot stamped on placeholders
    pub fn author(&self) -> Author {
        Author {
            id: self.id,
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Open thread: its parent and the loaded replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    pub parent: Message,
    pub replies: Vec<Message>,
    pub loading: bool,
}

impl ThreadView {
    pub fn new(parent: Message) -> Self {
        Self {
            parent,
            replies: Vec::new(),
            loading: true,
        }
    }

    pub fn parent_id(&self) -> MessageId {
        self.parent.id
    }
}

/// An authenticated session
#[derive(Debug)]
pub(crate) struct Session {
    pub id: SessionId,
    pub user: CurrentUser,
    pub subscriptions: Vec<SubscriptionId>,
    pub pump: Option<JoinHandle<()>>,
}

/// What the user is looking at, plus per-session bookkeeping
#[derive(Debug, Default)]
pub(crate) struct ViewState {
    pub active: Option<ConversationId>,
    pub messages: Vec<Message>,
    pub conversations: Vec<Conversation>,
    pub thread: Option<ThreadView>,
    pub has_more: HashMap<ConversationId, bool>,
    pub loading_older: HashSet<ConversationId>,
    pub unread_total: u32,
    pub last_pushed_unread: Option<u32>,
    pub last_read_success: HashMap<ConversationId, Instant>,
    pub seen: RecentIds,
}

impl ViewState {
    pub fn is_active(&self, conversation_id: ConversationId) -> bool {
        self.active == Some(conversation_id)
    }

    pub fn knows_conversation(&self, conversation_id: ConversationId) -> bool {
        self.conversations.iter().any(|c| c.id == conversation_id)
    }

    pub fn conversation_mut(&mut self, conversation_id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == conversation_id)
    }

    /// Open thread, if it belongs to `parent_id`
    pub fn thread_for(&mut self, parent_id: MessageId) -> Option<&mut ThreadView> {
        self.thread
            .as_mut()
            .filter(|thread| thread.parent_id() == parent_id)
    }

    /// Unread messages across every conversation
    pub fn compute_unread_total(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    /// Unknown conversations default to having more history
    pub fn has_more(&self, conversation_id: ConversationId) -> bool {
        self.has_more.get(&conversation_id).copied().unwrap_or(true)
    }
}

/// Client state guarded by the context mutex
#[derive(Debug, Default)]
pub(crate) struct ClientState {
    pub session: Option<Session>,
    pub view: ViewState,
}

impl ClientState {
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn is_current(&self, session_id: SessionId) -> bool {
        self.session_id() == Some(session_id)
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.session.as_ref().map(|s| &s.user)
    }
}
