//! Client error types

use huddle_cache::{CacheError, FeedError};
use huddle_common::{AppError, Notice};
use huddle_core::{DomainError, SessionId};

/// Client operation error
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    /// The session or conversation the operation started for is gone
    #[error("Operation outlived its session or conversation")]
    Stale,

    #[error("Client is missing a dependency: {0}")]
    MissingDependency(&'static str),
}

impl ClientError {
    /// Check if the user caused this (bad input)
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_validation())
    }

    /// Check if this result was discarded because its session ended
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    /// Check if this error only reflects a session change, given the
    /// `current` session
    ///
    /// A cache refusal counts when the caller is no longer the current
    /// session. A refusal aimed at the current session is a real fault.
    pub fn is_stale_for(&self, current: Option<SessionId>) -> bool {
        match self {
            Self::Stale => true,
            Self::Cache(CacheError::Unclaimed) => current.is_none(),
            Self::Cache(CacheError::NotOwner { caller, .. }) => current != Some(*caller),
            _ => false,
        }
    }

    /// User-facing notice for this error
    pub fn notice(&self) -> Notice {
        let mut notice = Notice::from(&AppError::from(self));
        if let Self::Domain(e) = self {
            notice.code = e.code().to_string();
        }
        notice
    }
}

impl From<&ClientError> for AppError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Domain(DomainError::NotSignedIn) => Self::NotSignedIn,
            ClientError::Domain(e) if e.is_validation() => Self::Validation(e.to_string()),
            ClientError::Domain(e) if e.is_not_found() => Self::NotFound(e.to_string()),
            ClientError::Domain(DomainError::Upload(msg)) => Self::Upload(msg.clone()),
            ClientError::Domain(e) => Self::Backend(e.to_string()),
            ClientError::Cache(e) => Self::Cache(e.to_string()),
            ClientError::Feed(e) => Self::Realtime(e.to_string()),
            ClientError::Stale => Self::SessionEnded,
            ClientError::MissingDependency(name) => Self::Config(format!("{name} is required")),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
