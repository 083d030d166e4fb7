//! Timers: keyed debouncing and bounded retry

mod debounce;
mod retry;

pub use debounce::{Debouncer, TimerKey};
pub use retry::RetryPolicy;
