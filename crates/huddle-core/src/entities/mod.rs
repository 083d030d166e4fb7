//! Domain entities - core business objects

mod conversation;
mod file;
mod message;
mod read_receipt;

pub use conversation::{
    sort_by_activity, Conversation, ConversationKind, LastMessage, Participant,
    LAST_MESSAGE_PREVIEW_LEN,
};
pub use file::{
    AttachmentPolicy, ComposedMessage, FileAttachment, OutgoingFile, UploadedFile,
    MAX_ATTACHMENTS_PER_SEND, MAX_BODY_CHARS,
};
pub use message::{Author, Message, PinMarker, ReactionSummary};
pub use read_receipt::ReadReceipt;
