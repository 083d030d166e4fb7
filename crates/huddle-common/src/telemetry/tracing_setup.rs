//! Tracing and logging setup
//!
//! Configures the `tracing` subscriber with environment-based filtering.
//! `RUST_LOG` wins over the configured level when set.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Layer, Registry,
};

use crate::config::Environment;

/// Crates whose debug output is noise for a chat client
const QUIET_TARGETS: &[&str] = &["hyper=warn", "rustls=warn", "tungstenite=warn", "reqwest=info"];

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter (e.g., "info", "debug", "trace")
    pub level: Level,
    /// Enable JSON output format
    pub json: bool,
    /// Include span close events (shows how long sends and fetches took)
    pub span_events: bool,
    /// Include file and line numbers
    pub file_line: bool,
    /// Include the event target (module path)
    pub target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            span_events: false,
            file_line: false,
            target: true,
        }
    }
}

impl TracingConfig {
    /// Create a development configuration with debug logging
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json: false,
            span_events: true,
            file_line: true,
            target: true,
        }
    }

    /// Create a production configuration with JSON logging
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json: true,
            span_events: false,
            file_line: false,
            target: true,
        }
    }

    /// Pick a configuration for an environment
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Staging | Environment::Production => Self::production(),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directives = std::iter::once(self.level.to_string())
                .chain(QUIET_TARGETS.iter().map(|d| (*d).to_string()))
                .collect::<Vec<_>>()
                .join(",");
            EnvFilter::new(directives)
        })
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_target(self.target)
            .with_span_events(self.span_events());

        if self.json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    }
}

/// Initialize the tracing subscriber with default configuration
///
/// # Panics
/// Panics if the subscriber cannot be initialized (usually means it's already set).
pub fn init_tracing() {
    init_tracing_with_config(TracingConfig::default());
}

/// Initialize the tracing subscriber with custom configuration
///
/// # Panics
/// Panics if the subscriber cannot be initialized (usually means it's already set).
pub fn init_tracing_with_config(config: TracingConfig) {
    if let Err(e) = install(&config) {
        panic!("failed to initialize tracing: {e}");
    }
}

/// Try to initialize tracing, returning an error if already initialized
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

/// Try to initialize tracing with custom configuration
///
/// Unlike `init_tracing_with_config`, this function will not panic if called multiple times.
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    install(&config).map_err(|_| TracingError::AlreadyInitialized)
}

fn install(config: &TracingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
