//! Boundary events - backend rows and realtime notifications

mod realtime;
pub mod rows;

pub use realtime::{RealtimeEvent, RealtimeTable, RowInserted};
pub use rows::{
    convert_rows, ConversationRow, MessageReadRow, MessageRow, PinRow, ReactionRow,
};
