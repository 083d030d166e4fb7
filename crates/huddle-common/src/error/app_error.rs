//! Application error types
//!
//! Unified error handling for the client, plus the transient notices shown to
//! the user when something fails.

use huddle_core::DomainError;
use serde::Serialize;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Session errors
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Session ended before the operation completed")]
    SessionEnded,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    // Backend errors
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    // Local cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    // Realtime errors
    #[error("Realtime error: {0}")]
    Realtime(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Get error code for notices and logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotSignedIn => "NOT_SIGNED_IN",
            Self::SessionEnded => "SESSION_ENDED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Upload(_) => "UPLOAD_FAILED",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Realtime(_) => "REALTIME_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the user caused this (bad input) rather than the system
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Domain(e) => e.is_validation(),
            _ => false,
        }
    }

    /// Check if this is a transient collaborator failure
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(_) | Self::Upload(_) | Self::Realtime(_) => true,
            Self::Domain(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Check if the failure belongs to a session that no longer exists
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::SessionEnded)
    }

    /// Create a not found error for a resource type
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound(resource.to_string())
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(msg: impl fmt::Display) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Inline hint next to the composer
    Inline,
    /// Transient toast
    Toast,
}

/// User-facing, non-fatal notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub code: String,
    pub message: String,
}

impl Notice {
    /// Create a toast with a custom message
    pub fn toast(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Toast,
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        Self {
            level: if err.is_validation() {
                NoticeLevel::Inline
            } else {
                NoticeLevel::Toast
            },
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for Notice {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
