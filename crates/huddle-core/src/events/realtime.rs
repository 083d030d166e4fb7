//! Realtime change-feed events
//!
//! The backend pushes "row inserted" notifications for a handful of tables.
//! Raw notifications are decoded here into strict domain events before any
//! state is touched.

use serde::{Deserialize, Serialize};

use super::rows::{MessageReadRow, MessageRow};
use crate::entities::{Message, ReadReceipt};
use crate::error::DomainError;

/// Tables the client subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealtimeTable {
    Messages,
    MessageReads,
}

impl RealtimeTable {
    /// Every table the reconciler consumes
    pub const ALL: [Self; 2] = [Self::Messages, Self::MessageReads];

    /// Backend table name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::MessageReads => "message_reads",
        }
    }

    /// Parse a backend table name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "messages" => Some(Self::Messages),
            "message_reads" => Some(Self::MessageReads),
            _ => None,
        }
    }
}

impl std::fmt::Display for RealtimeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw "row inserted" notification, shape not yet trusted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowInserted {
    pub table: String,
    pub record: serde_json::Value,
}

impl RowInserted {
    /// Create a notification for `table`
    pub fn new(table: RealtimeTable, record: serde_json::Value) -> Self {
        Self {
            table: table.name().to_string(),
            record,
        }
    }
}

/// Validated realtime event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    MessageInserted(Message),
    ReadReceiptInserted(ReadReceipt),
}

impl RealtimeEvent {
    /// Decode a raw notification
    pub fn decode(raw: &RowInserted) -> Result<Self, DomainError> {
        let table = RealtimeTable::parse(&raw.table)
            .ok_or_else(|| DomainError::MalformedEvent(format!("unknown table {}", raw.table)))?;

        match table {
            RealtimeTable::Messages => {
                let row: MessageRow = serde_json::from_value(raw.record.clone())
                    .map_err(|e| DomainError::MalformedEvent(format!("messages: {e}")))?;
                Message::try_from(row).map(Self::MessageInserted)
            }
            RealtimeTable::MessageReads => {
                let row: MessageReadRow = serde_json::from_value(raw.record.clone())
                    .map_err(|e| DomainError::MalformedEvent(format!("message_reads: {e}")))?;
                Ok(Self::ReadReceiptInserted(ReadReceipt::from(row)))
            }
        }
    }
}
