//! Media service abstraction
//!
//! An upload is one awaitable call: it completes when the service has stored the asset
//! (and queued any eager renditions) and yields the service's own description of it.

use async_trait::async_trait;
use bytes::Bytes;
use framely_core::models::MediaKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Media service failures
#[derive(Debug, Error)]
pub enum MediaServiceError {
    #[error("Request to media service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Media service rejected the upload with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from media service: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendition the service should generate right after upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EagerTransform {
    pub width: u32,
    pub height: u32,
    pub crop: String,
}

impl EagerTransform {
    pub fn padded(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: "pad".to_string(),
        }
    }

    /// Transformation string, e.g. `c_pad,w_1280,h_720`
    pub fn directive(&self) -> String {
        format!("c_{},w_{},h_{}", self.crop, self.width, self.height)
    }
}

/// Where the uploaded bytes come from
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Bytes already held in memory
    Bytes { data: Bytes, file_name: String },
    /// A file on local disk, streamed to the service
    File { path: PathBuf, file_name: String },
}

impl UploadSource {
    pub fn file_name(&self) -> &str {
        match self {
            UploadSource::Bytes { file_name, .. } | UploadSource::File { file_name, .. } => {
                file_name
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub kind: MediaKind,
    pub folder: String,
    pub eager: Vec<EagerTransform>,
    pub eager_async: bool,
    pub source: UploadSource,
}

impl UploadRequest {
    /// Image upload from memory into `folder`
    pub fn image(folder: impl Into<String>, data: Bytes, file_name: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            folder: folder.into(),
            eager: Vec::new(),
            eager_async: false,
            source: UploadSource::Bytes {
                data,
                file_name: file_name.into(),
            },
        }
    }

    /// Video upload streamed from disk, with the asynchronous 1280x720 padded preview
    pub fn video(
        folder: impl Into<String>,
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: MediaKind::Video,
            folder: folder.into(),
            eager: vec![EagerTransform::padded(1280, 720)],
            eager_async: true,
            source: UploadSource::File {
                path: path.into(),
                file_name: file_name.into(),
            },
        }
    }
}

/// What the service reports about a stored asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    /// Stored size in bytes
    pub bytes: u64,
    /// Duration in seconds (video and audio only)
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub secure_url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[async_trait]
pub trait MediaService: Send + Sync {
    /// Upload one asset and wait for the service to confirm it
    async fn upload(&self, request: UploadRequest) -> Result<UploadedAsset, MediaServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_request_carries_preview() {
        let request = UploadRequest::video("video-uploads", "/tmp/clip", "clip.mp4");
        assert_eq!(request.kind, MediaKind::Video);
        assert!(request.eager_async);
        assert_eq!(request.eager.len(), 1);
        assert_eq!(request.eager[0].directive(), "c_pad,w_1280,h_720");
        assert_eq!(request.source.file_name(), "clip.mp4");
    }

    #[test]
    fn test_image_request_has_no_eager() {
        let request = UploadRequest::image("next-cloudinary-uploads", Bytes::from_static(b"x"), "a.png");
        assert!(request.eager.is_empty());
        assert!(!request.eager_async);
    }

    #[test]
    fn test_asset_without_duration() {
        let asset: UploadedAsset =
            serde_json::from_str(r#"{"public_id":"a/b","bytes":1234,"format":"png"}"#).unwrap();
        assert_eq!(asset.bytes, 1234);
        assert_eq!(asset.duration, None);
    }
}
