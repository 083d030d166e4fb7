//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{ConversationId, MessageId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("No conversation selected")]
    NoActiveConversation,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Too many attachments: max {max} per message")]
    TooManyAttachments { max: usize },

    #[error("File {name} is too large: max {max_bytes} bytes")]
    AttachmentTooLarge { name: String, max_bytes: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    // =========================================================================
    // Boundary Errors
    // =========================================================================
    #[error("Malformed realtime event: {0}")]
    MalformedEvent(String),

    #[error("Malformed backend row: {0}")]
    MalformedRow(String),

    // =========================================================================
    // Collaborator Errors (wrapped)
    // =========================================================================
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Realtime feed error: {0}")]
    Realtime(String),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for user notices and logs
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::ConversationNotFound(_) => "UNKNOWN_CONVERSATION",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::NoActiveConversation => "NO_ACTIVE_CONVERSATION",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::TooManyAttachments { .. } => "TOO_MANY_ATTACHMENTS",
            Self::AttachmentTooLarge { .. } => "ATTACHMENT_TOO_LARGE",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",

            // Boundary
            Self::MalformedEvent(_) => "MALFORMED_EVENT",
            Self::MalformedRow(_) => "MALFORMED_ROW",

            // Collaborators
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Upload(_) => "UPLOAD_FAILED",
            Self::Realtime(_) => "REALTIME_ERROR",
            Self::NotSignedIn => "NOT_SIGNED_IN",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConversationNotFound(_) | Self::MessageNotFound(_) | Self::NoActiveConversation
        )
    }

    /// Check if this is a validation error (rejected before any network call)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyMessage
                | Self::ContentTooLong { .. }
                | Self::TooManyAttachments { .. }
                | Self::AttachmentTooLarge { .. }
                | Self::UnsupportedFileType(_)
        )
    }

    /// Check if this is a transient collaborator failure
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Upload(_) | Self::Realtime(_)
        )
    }
}
