//! Domain methods for the Framely API client.
//!
//! Response types come from `framely_core::models`; `SessionInfo` mirrors the
//! `/api/session` body.

use crate::{error_for_status, ApiClient};
use anyhow::{Context, Result};
use bytes::Bytes;
use framely_core::models::{ImageUploadResponse, VideoResponse};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use uuid::Uuid;

/// Identity of the signed-in user as seen by the server
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub session_id: Option<String>,
}

async fn file_part(path: &Path, content_type: &str) -> Result<Part> {
    let buffer = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    Part::bytes(buffer)
        .file_name(filename)
        .mime_str(content_type)
        .with_context(|| format!("Invalid content type: {}", content_type))
}

impl ApiClient {
    /// Upload an image through the upload proxy; returns its content identifier.
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_image(
        &self,
        path: &Path,
        content_type: &str,
    ) -> Result<ImageUploadResponse> {
        let form = Form::new().part("file", file_part(path, content_type).await?);
        self.post_multipart("/api/image-upload", form).await
    }

    /// Submit a video with its title and description to the ingest endpoint.
    #[tracing::instrument(skip(self, description), fields(path = %path.display()))]
    pub async fn upload_video(
        &self,
        path: &Path,
        content_type: &str,
        title: &str,
        description: &str,
    ) -> Result<VideoResponse> {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", description.to_string())
            .part("file", file_part(path, content_type).await?);
        self.post_multipart("/api/video-upload", form).await
    }

    /// List ingested videos, newest first.
    pub async fn list_videos(&self, limit: i64, offset: i64) -> Result<Vec<VideoResponse>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get("/api/videos", &query).await
    }

    pub async fn get_video(&self, id: Uuid) -> Result<VideoResponse> {
        self.get(&format!("/api/videos/{}", id), &[]).await
    }

    /// Who the server thinks we are.
    pub async fn session(&self) -> Result<SessionInfo> {
        self.get("/api/session", &[]).await
    }

    /// Fetch a rendition straight from the media service's delivery URL (no API auth).
    #[tracing::instrument(skip(self))]
    pub async fn fetch_rendition(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .context("Failed to fetch rendition")?;
        let response = error_for_status(response).await?;

        response
            .bytes()
            .await
            .context("Failed to read rendition body")
    }
}
