//! `FileUploader` over the storage service
//!
//! Files land at `<user>/<conversation>/<millis>-<name>` in the configured
//! bucket and are served back through the bucket's public URL.

use async_trait::async_trait;
use chrono::Utc;
use huddle_common::BackendConfig;
use huddle_core::{
    BackendResult, ConversationId, DomainError, FileUploader, OutgoingFile, UploadedFile, UserId,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

use crate::http::HttpClient;

/// Storage object path for an upload
pub fn object_path(
    user_id: UserId,
    conversation_id: ConversationId,
    millis: i64,
    file_name: &str,
) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{user_id}/{conversation_id}/{millis}-{safe_name}")
}

/// Storage uploader
#[derive(Debug, Clone)]
pub struct StorageUploader {
    http: HttpClient,
    bucket: String,
}

impl StorageUploader {
    /// Create an uploader from configuration
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let http = HttpClient::from_config(config)
            .map_err(|e| DomainError::Upload(e.to_string()))?;
        Ok(Self::with_client(http, config.storage_bucket.clone()))
    }

    /// Create an uploader sharing an existing HTTP client
    pub fn with_client(http: HttpClient, bucket: impl Into<String>) -> Self {
        Self {
            http,
            bucket: bucket.into(),
        }
    }

    fn upload_path(&self, path: &str) -> String {
        format!("/storage/v1/object/{}/{path}", self.bucket)
    }

    /// Public URL of a stored object
    pub fn public_url(&self, path: &str) -> String {
        self.http
            .url(&format!("/storage/v1/object/public/{}/{path}", self.bucket))
    }
}

#[async_trait]
impl FileUploader for StorageUploader {
    async fn upload(
        &self,
        file: &OutgoingFile,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> BackendResult<UploadedFile> {
        let path = object_path(user_id, conversation_id, Utc::now().timestamp_millis(), &file.name);

        let request = self
            .http
            .request(Method::POST, &self.upload_path(&path))
            .header(CONTENT_TYPE, file.mime_type.as_str())
            .header("x-upsert", "false")
            .body(file.data.clone());

        self.http
            .send_empty(request)
            .await
            .map_err(|e| DomainError::Upload(format!("{}: {e}", file.name)))?;

        tracing::debug!(path = %path, size = file.size(), "File uploaded");

        Ok(UploadedFile {
            url: self.public_url(&path),
            file_name: file.name.clone(),
            file_type: file.mime_type.clone(),
            file_size: file.size(),
        })
    }
}
