//! Client services
//!
//! Each service borrows the [`ClientContext`](crate::ClientContext) and owns
//! one concern of the sync engine.

pub mod conversations;
pub mod pagination;
pub mod read_state;
pub mod reconciler;
pub mod sending;
pub mod session;

pub use conversations::ConversationService;
pub use pagination::PaginationService;
pub use read_state::ReadStateService;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use sending::{SendReport, SendService};
pub use session::SessionService;
