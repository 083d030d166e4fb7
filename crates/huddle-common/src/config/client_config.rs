//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use huddle_core::AttachmentPolicy;
use serde::Deserialize;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub backend: BackendConfig,
    pub messaging: MessagingConfig,
    pub timing: TimingConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Hosted backend endpoints and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the query API
    pub url: String,
    /// Websocket URL of the realtime feed
    pub realtime_url: String,
    /// Project API key sent with every request
    pub api_key: Option<String>,
    /// Bearer token of the signed-in user
    pub access_token: Option<String>,
    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Messaging limits
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default = "default_max_attachments")]
    pub max_attachments: usize,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Pause between consecutive messages of a multi-file send
    #[serde(default = "default_multi_file_delay_ms")]
    pub multi_file_delay_ms: u64,
}

impl MessagingConfig {
    /// Attachment policy derived from these limits
    #[must_use]
    pub fn attachment_policy(&self) -> AttachmentPolicy {
        AttachmentPolicy {
            max_files: self.max_attachments,
            max_file_size: self.max_file_size_mb * 1024 * 1024,
            ..AttachmentPolicy::default()
        }
    }

    #[must_use]
    pub fn multi_file_delay(&self) -> Duration {
        Duration::from_millis(self.multi_file_delay_ms)
    }
}

/// Debounce and retry timings
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Quiet period before a mark-as-read call fires
    #[serde(default = "default_read_debounce_ms")]
    pub read_debounce_ms: u64,
    /// Minimum gap after a successful mark-as-read for the same conversation
    #[serde(default = "default_read_min_interval_ms")]
    pub read_min_interval_ms: u64,
    /// Quiet period before the unread total is pushed
    #[serde(default = "default_unread_push_debounce_ms")]
    pub unread_push_debounce_ms: u64,
    /// Attempts made to discover a conversation seen only through the feed
    #[serde(default = "default_discovery_attempts")]
    pub discovery_attempts: u32,
    #[serde(default = "default_discovery_base_delay_ms")]
    pub discovery_base_delay_ms: u64,
    #[serde(default = "default_realtime_reconnect_delay_ms")]
    pub realtime_reconnect_delay_ms: u64,
}

impl TimingConfig {
    #[must_use]
    pub fn read_debounce(&self) -> Duration {
        Duration::from_millis(self.read_debounce_ms)
    }

    #[must_use]
    pub fn read_min_interval(&self) -> Duration {
        Duration::from_millis(self.read_min_interval_ms)
    }

    #[must_use]
    pub fn unread_push_debounce(&self) -> Duration {
        Duration::from_millis(self.unread_push_debounce_ms)
    }

    #[must_use]
    pub fn discovery_base_delay(&self) -> Duration {
        Duration::from_millis(self.discovery_base_delay_ms)
    }

    #[must_use]
    pub fn realtime_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.realtime_reconnect_delay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            read_debounce_ms: default_read_debounce_ms(),
            read_min_interval_ms: default_read_min_interval_ms(),
            unread_push_debounce_ms: default_unread_push_debounce_ms(),
            discovery_attempts: default_discovery_attempts(),
            discovery_base_delay_ms: default_discovery_base_delay_ms(),
            realtime_reconnect_delay_ms: default_realtime_reconnect_delay_ms(),
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            context_window: default_context_window(),
            max_attachments: default_max_attachments(),
            max_file_size_mb: default_max_file_size_mb(),
            multi_file_delay_ms: default_multi_file_delay_ms(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
            },
            backend: BackendConfig {
                url: "http://127.0.0.1:54321".to_string(),
                realtime_url: "ws://127.0.0.1:54321/realtime/v1/websocket".to_string(),
                api_key: None,
                access_token: None,
                storage_bucket: default_storage_bucket(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            messaging: MessagingConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "huddle".to_string()
}

fn default_storage_bucket() -> String {
    "chat-files".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_page_size() -> usize {
    50
}

fn default_context_window() -> usize {
    25
}

fn default_max_attachments() -> usize {
    huddle_core::entities::MAX_ATTACHMENTS_PER_SEND
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_multi_file_delay_ms() -> u64 {
    150
}

fn default_read_debounce_ms() -> u64 {
    300
}

fn default_read_min_interval_ms() -> u64 {
    2000
}

fn default_unread_push_debounce_ms() -> u64 {
    500
}

fn default_discovery_attempts() -> u32 {
    3
}

fn default_discovery_base_delay_ms() -> u64 {
    500
}

fn default_realtime_reconnect_delay_ms() -> u64 {
    1000
}

/// Read an optional variable, failing on values that do not parse
fn parse_var<T: FromStr>(key: &'static str, default: fn() -> T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(default()),
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let url = env::var("HUDDLE_BACKEND_URL")
            .map_err(|_| ConfigError::MissingVar("HUDDLE_BACKEND_URL"))?;
        let url = url.trim_end_matches('/').to_string();
        let realtime_url = env::var("HUDDLE_REALTIME_URL").unwrap_or_else(|_| {
            format!(
                "{}/realtime/v1/websocket",
                url.replacen("https://", "wss://", 1)
                    .replacen("http://", "ws://", 1)
            )
        });

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            backend: BackendConfig {
                url,
                realtime_url,
                api_key: env::var("HUDDLE_API_KEY").ok(),
                access_token: env::var("HUDDLE_ACCESS_TOKEN").ok(),
                storage_bucket: env::var("HUDDLE_STORAGE_BUCKET")
                    .unwrap_or_else(|_| default_storage_bucket()),
                request_timeout_secs: parse_var(
                    "HUDDLE_REQUEST_TIMEOUT_SECS",
                    default_request_timeout_secs,
                )?,
            },
            messaging: MessagingConfig {
                page_size: parse_var("HUDDLE_PAGE_SIZE", default_page_size)?,
                context_window: parse_var("HUDDLE_CONTEXT_WINDOW", default_context_window)?,
                max_attachments: parse_var("HUDDLE_MAX_ATTACHMENTS", default_max_attachments)?,
                max_file_size_mb: parse_var("HUDDLE_MAX_FILE_SIZE_MB", default_max_file_size_mb)?,
                multi_file_delay_ms: parse_var(
                    "HUDDLE_MULTI_FILE_DELAY_MS",
                    default_multi_file_delay_ms,
                )?,
            },
            timing: TimingConfig {
                read_debounce_ms: parse_var("HUDDLE_READ_DEBOUNCE_MS", default_read_debounce_ms)?,
                read_min_interval_ms: parse_var(
                    "HUDDLE_READ_MIN_INTERVAL_MS",
                    default_read_min_interval_ms,
                )?,
                unread_push_debounce_ms: parse_var(
                    "HUDDLE_UNREAD_PUSH_DEBOUNCE_MS",
                    default_unread_push_debounce_ms,
                )?,
                discovery_attempts: parse_var(
                    "HUDDLE_DISCOVERY_ATTEMPTS",
                    default_discovery_attempts,
                )?,
                discovery_base_delay_ms: parse_var(
                    "HUDDLE_DISCOVERY_BASE_DELAY_MS",
                    default_discovery_base_delay_ms,
                )?,
                realtime_reconnect_delay_ms: parse_var(
                    "HUDDLE_REALTIME_RECONNECT_DELAY_MS",
                    default_realtime_reconnect_delay_ms,
                )?,
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
