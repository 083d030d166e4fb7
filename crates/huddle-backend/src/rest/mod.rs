//! Query API adapter

mod backend;
mod dto;
pub mod routes;

pub use backend::RestBackend;
pub use dto::{MessagePageResponse, SendMessageRequest, UnreadTotalRequest};
