//! Temporary message id generator
//!
//! Placeholders are keyed by `temp-<millis>`. Two sends in the same
//! millisecond (multi-file sends do this) must still get distinct ids, so the
//! generator hands out strictly increasing values.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use super::MessageId;

/// Thread-safe, lock-free temp id generator
#[derive(Debug, Default)]
pub struct TempIdGenerator {
    last: AtomicI64,
}

impl TempIdGenerator {
    /// Create a new generator
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Generate a new temporary id, never equal to a previous one
    pub fn generate(&self) -> MessageId {
        MessageId::Temp(self.next_value(Utc::now().timestamp_millis()))
    }

    fn next_value(&self, now_ms: i64) -> i64 {
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let candidate = if now_ms > last { now_ms } else { last + 1 };
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return candidate,
                Err(current) => last = current,
            }
        }
    }
}
