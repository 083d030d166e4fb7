//! Value objects - immutable types that represent domain concepts

mod ids;
mod temp_id;

pub use ids::{ConversationId, IdParseError, MessageId, SessionId, UserId, TEMP_ID_PREFIX};
pub use temp_id::TempIdGenerator;
