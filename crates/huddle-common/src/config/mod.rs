//! Configuration structs

mod client_config;

pub use client_config::{
    AppSettings, BackendConfig, ClientConfig, ConfigError, Environment, MessagingConfig,
    TimingConfig,
};
