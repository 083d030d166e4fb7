//! # huddle-core
//!
//! Domain layer for the huddle client: conversations, messages, read receipts,
//! realtime event decoding, and the ports through which the client reaches the
//! hosted backend. This crate has no dependencies on runtime or transport.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    sort_by_activity, AttachmentPolicy, Author, ComposedMessage, Conversation, ConversationKind,
    FileAttachment, LastMessage, Message, OutgoingFile, Participant, PinMarker, ReactionSummary,
    ReadReceipt, UploadedFile,
};
pub use error::DomainError;
pub use events::{RealtimeEvent, RealtimeTable, RowInserted};
pub use traits::{BackendResult, ChatBackend, FileUploader, MessagePage, NewMessage};
pub use value_objects::{
    ConversationId, IdParseError, MessageId, SessionId, TempIdGenerator, UserId,
};
