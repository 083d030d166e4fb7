//! Shared HTTP plumbing
//!
//! Builds authenticated requests against the backend base URL and turns
//! transport failures and non-success statuses into [`HttpError`].

use std::time::Duration;

use huddle_common::BackendConfig;
use huddle_core::DomainError;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Error type for HTTP calls
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl HttpError {
    /// Check if the backend rejected the request as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl From<HttpError> for DomainError {
    fn from(err: HttpError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Authenticated HTTP client bound to one backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    base_url: String,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl HttpClient {
    /// Build a client from backend configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| HttpError::Config(e.to_string()))?;

        Ok(Self {
            inner,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Same client, acting for a different signed-in user
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path` (which starts with `/`)
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Start an authenticated request
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.inner.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key);
        }
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, HttpError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send and discard the response body
    pub async fn send_empty(&self, builder: RequestBuilder) -> Result<(), HttpError> {
        Self::check(builder.send().await?).await?;
        Ok(())
    }

    async fn check(response: Response) -> Result<Response, HttpError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %body, "Backend request rejected");
        Err(HttpError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
