//! # huddle-common
//!
//! Shared utilities including configuration, error handling, user notices, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppSettings, BackendConfig, ClientConfig, ConfigError, Environment, MessagingConfig,
    TimingConfig,
};
pub use error::{AppError, AppResult, Notice, NoticeLevel};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
