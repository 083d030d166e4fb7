//! Realtime topic definitions.
//!
//! Defines the topic naming convention of the hosted realtime feed.

use huddle_core::RealtimeTable;

/// Topic prefix for row-change topics in the public schema
pub const TOPIC_PREFIX: &str = "realtime:public:";

/// Realtime topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RealtimeTopic(RealtimeTable);

impl RealtimeTopic {
    /// Topic carrying inserts of `table`
    #[must_use]
    pub const fn table(table: RealtimeTable) -> Self {
        Self(table)
    }

    /// Table behind this topic
    #[must_use]
    pub const fn realtime_table(self) -> RealtimeTable {
        self.0
    }

    /// Get the wire topic name
    #[must_use]
    pub fn name(self) -> String {
        format!("{TOPIC_PREFIX}{}", self.0.name())
    }

    /// Parse a topic name back to a `RealtimeTopic`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.strip_prefix(TOPIC_PREFIX)
            .and_then(RealtimeTable::parse)
            .map(Self)
    }
}

impl From<RealtimeTable> for RealtimeTopic {
    fn from(table: RealtimeTable) -> Self {
        Self(table)
    }
}
