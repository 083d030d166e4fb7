//! File attachments - outgoing files, uploaded files, and the attachment policy

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;

/// Maximum number of files a single send may carry
pub const MAX_ATTACHMENTS_PER_SEND: usize = 5;

/// Maximum length of a message body in characters
pub const MAX_BODY_CHARS: usize = 4000;

/// A file picked by the user, not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct OutgoingFile {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 3, max = 127, message = "Invalid MIME type"))]
    pub mime_type: String,

    pub data: Vec<u8>,
}

impl OutgoingFile {
    /// Create a new outgoing file
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Size in bytes
    #[inline]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Ephemeral reference shown by a placeholder until the upload completes
    pub fn preview_ref(&self) -> String {
        format!("local://{}", self.name)
    }
}

/// Result of a successful storage upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
}

/// Attachment carried by a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    /// True while `url` points at a local preview rather than storage
    #[serde(default)]
    pub local_preview: bool,
}

impl FileAttachment {
    /// Placeholder attachment for an optimistic message
    pub fn preview(file: &OutgoingFile) -> Self {
        Self {
            url: file.preview_ref(),
            file_name: file.name.clone(),
            file_type: file.mime_type.clone(),
            file_size: file.size(),
            local_preview: true,
        }
    }

    /// Check if attachment is an image
    pub fn is_image(&self) -> bool {
        self.file_type.starts_with("image/")
    }
}

impl From<UploadedFile> for FileAttachment {
    fn from(file: UploadedFile) -> Self {
        Self {
            url: file.url,
            file_name: file.file_name,
            file_type: file.file_type,
            file_size: file.file_size,
            local_preview: false,
        }
    }
}

/// Text plus files the user submitted in one send
#[derive(Debug, Clone, Default, Validate)]
pub struct ComposedMessage {
    pub text: String,

    #[validate(nested)]
    pub files: Vec<OutgoingFile>,
}

impl ComposedMessage {
    /// Trimmed text, or `None` when only whitespace was entered
    pub fn trimmed_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// An empty composer with no files
    pub fn is_empty(&self) -> bool {
        self.trimmed_text().is_none() && self.files.is_empty()
    }
}

/// Limits on what may be attached to a send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub max_files: usize,
    pub max_file_size: u64,
    /// Allowed MIME types; entries ending in `/` match by prefix
    pub allowed_types: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_files: MAX_ATTACHMENTS_PER_SEND,
            max_file_size: 10 * 1024 * 1024,
            allowed_types: [
                "image/",
                "video/",
                "audio/",
                "text/",
                "application/pdf",
                "application/zip",
                "application/json",
                "application/msword",
                "application/vnd.openxmlformats-officedocument.",
                "application/vnd.ms-excel",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl AttachmentPolicy {
    /// Check if a MIME type is on the allow-list
    pub fn allows_type(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|allowed| {
            if allowed.ends_with('/') || allowed.ends_with('.') {
                mime_type.starts_with(allowed.as_str())
            } else {
                mime_type == allowed
            }
        })
    }

    /// Validate a composed message before any placeholder or network call
    pub fn check(&self, message: &ComposedMessage) -> Result<(), DomainError> {
        if message.is_empty() {
            return Err(DomainError::EmptyMessage);
        }
        if message.text.chars().count() > MAX_BODY_CHARS {
            return Err(DomainError::ContentTooLong { max: MAX_BODY_CHARS });
        }
        if message.files.len() > self.max_files {
            return Err(DomainError::TooManyAttachments {
                max: self.max_files,
            });
        }
        message
            .validate()
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        for file in &message.files {
            if file.size() > self.max_file_size {
                return Err(DomainError::AttachmentTooLarge {
                    name: file.name.clone(),
                    max_bytes: self.max_file_size,
                });
            }
            if !self.allows_type(&file.mime_type) {
                return Err(DomainError::UnsupportedFileType(file.mime_type.clone()));
            }
        }
        Ok(())
    }
}
