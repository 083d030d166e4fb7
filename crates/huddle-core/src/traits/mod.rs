//! Collaborator ports

mod backend;

pub use backend::{BackendResult, ChatBackend, FileUploader, MessagePage, NewMessage};
