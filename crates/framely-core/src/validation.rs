//! Client-side upload rules
//!
//! A selected file is checked against an `UploadRule` before any network call is made.

use crate::models::MediaKind;

pub const MAX_IMAGE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_VIDEO_SIZE: u64 = 70 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a valid {kind} file")]
    InvalidContentType { kind: MediaKind, content_type: String },

    #[error("File size must be less than {max_mb}MB")]
    FileTooLarge { size: u64, max_mb: u64 },
}

/// A file picked by the user: name, declared MIME type and size in bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size,
        }
    }
}

/// MIME prefix plus size ceiling accepted by a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRule {
    pub kind: MediaKind,
    pub max_size: u64,
}

impl UploadRule {
    pub const IMAGE: UploadRule = UploadRule {
        kind: MediaKind::Image,
        max_size: MAX_IMAGE_SIZE,
    };

    pub const VIDEO: UploadRule = UploadRule {
        kind: MediaKind::Video,
        max_size: MAX_VIDEO_SIZE,
    };

    pub fn check(&self, file: &SelectedFile) -> Result<(), ValidationError> {
        if !file
            .content_type
            .to_ascii_lowercase()
            .starts_with(self.kind.mime_prefix())
        {
            return Err(ValidationError::InvalidContentType {
                kind: self.kind,
                content_type: file.content_type.clone(),
            });
        }

        if file.size > self.max_size {
            return Err(ValidationError::FileTooLarge {
                size: file.size,
                max_mb: self.max_size / (1024 * 1024),
            });
        }

        Ok(())
    }
}
