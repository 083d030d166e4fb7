//! # huddle-client
//!
//! Sync engine of the chat client: optimistic sends, realtime
//! reconciliation, history pagination, and read/unread aggregation on top of
//! the session-owned conversation cache.
//!
//! ## Example
//!
//! ```ignore
//! use huddle_client::{ChatClient, CurrentUser};
//!
//! let ctx = ChatClient::builder()
//!     .backend(backend)
//!     .uploader(uploader)
//!     .feed(hub)
//!     .config(config)
//!     .build()?;
//! let client = ChatClient::new(ctx);
//!
//! client.sign_in(CurrentUser::new(user_id))?;
//! client.refresh(false).await?;
//! client.select_conversation(conversation_id).await?;
//! client.send_message("hello", None, Vec::new()).await?;
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod events;
pub mod services;
pub mod state;
pub mod timing;

pub use client::ChatClient;
pub use context::{ClientContext, ClientContextBuilder};
pub use error::{ClientError, ClientResult};
pub use events::ClientEvent;
pub use services::{ReconcileOutcome, SendReport};
pub use state::{window, CurrentUser, ThreadView};
