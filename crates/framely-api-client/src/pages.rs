//! The four client pages
//!
//! Each page drives an [`UploadSession`] against the API: it validates the picked file,
//! uploads it, renders the recipe's rendition and downloads it into a directory.

use anyhow::{Context, Result};
use framely_core::models::{ContentId, VideoResponse};
use framely_core::session::{
    BackgroundRemoval, GenerativeBackground, Rendition, SessionError, SocialShare, UploadSession,
    VideoPreview, DOWNLOAD_FAILED_MESSAGE,
};
use framely_core::{DeliveryTarget, SelectedFile, SocialFormat, UploadRule};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::{server_message, ApiClient};

pub const IMAGE_UPLOAD_FAILED_MESSAGE: &str = "Image upload failed";
pub const VIDEO_UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";
pub const GENERATE_FAILED_MESSAGE: &str =
    "Failed to generate background. Please try a different prompt.";
pub const TRANSFORM_FAILED_MESSAGE: &str = "Failed to transform image. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PageError {
    fn failed(message: impl Into<String>, source: anyhow::Error) -> Self {
        PageError::Failed {
            message: message.into(),
            source: source.into(),
        }
    }
}

/// Delivery target from FRAMELY_CLOUD_NAME and FRAMELY_DELIVERY_BASE_URL
pub fn delivery_target_from_env() -> Result<DeliveryTarget> {
    let cloud_name = std::env::var("FRAMELY_CLOUD_NAME")
        .context("Missing cloud name. Set FRAMELY_CLOUD_NAME")?;
    let base_url = std::env::var("FRAMELY_DELIVERY_BASE_URL")
        .unwrap_or_else(|_| "https://res.cloudinary.com".to_string());
    Ok(DeliveryTarget::new(base_url.trim_end_matches('/'), cloud_name))
}

/// MIME type from the file extension
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

/// A file on disk as the user picked it
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub path: PathBuf,
    pub selected: SelectedFile,
}

impl LocalFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let selected = SelectedFile::new(name, guess_content_type(&path), metadata.len());
        Ok(Self { path, selected })
    }
}

/// Download names may embed the asset's folder; keep them inside the destination
fn download_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// Recipes whose page uploads through the image proxy
pub trait ImageRecipe: Rendition {}

impl ImageRecipe for BackgroundRemoval {}
impl ImageRecipe for GenerativeBackground {}
impl ImageRecipe for SocialShare {}

pub type BackgroundRemovalPage = Page<BackgroundRemoval>;
pub type GenerativeBackgroundPage = Page<GenerativeBackground>;
pub type SocialSharePage = Page<SocialShare>;
pub type VideoUploadPage = Page<VideoPreview>;

/// One page: an API client plus the page's upload session
pub struct Page<R: Rendition> {
    client: ApiClient,
    session: UploadSession<R>,
}

impl<R: Rendition> Page<R> {
    pub fn new(client: ApiClient, rule: UploadRule, recipe: R, target: DeliveryTarget) -> Self {
        Self {
            client,
            session: UploadSession::new(rule, recipe, target),
        }
    }

    pub fn session(&self) -> &UploadSession<R> {
        &self.session
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    fn upload_failed(&mut self, fallback: &str, error: anyhow::Error) -> PageError {
        let message = server_message(&error).unwrap_or(fallback).to_string();
        tracing::warn!(error = %error, "Upload failed");
        self.session.upload_failed(message.clone());
        PageError::failed(message, error)
    }

    /// Change the recipe and wait until the new rendition renders
    async fn transform<F>(&mut self, change: F, failure_message: &str) -> Result<String, PageError>
    where
        F: FnOnce(&mut R) -> Result<(), SessionError>,
    {
        let url = self.session.begin_transform(change)?;

        match self.client.fetch_rendition(&url).await {
            Ok(_) => {
                self.session.finish_transform();
                Ok(url)
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Rendition failed to render");
                self.session.transform_failed(failure_message);
                Err(PageError::failed(failure_message, e))
            }
        }
    }

    /// Download the rendition currently displayed into `dest_dir`
    pub async fn download(&mut self, dest_dir: &Path) -> Result<PathBuf, PageError> {
        let (url, name) = self.session.begin_download()?;

        match self.save_rendition(&url, &name, dest_dir).await {
            Ok(path) => {
                self.session.finish_download(true);
                tracing::info!(path = %path.display(), "Rendition downloaded");
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "Rendition download failed");
                self.session.finish_download(false);
                Err(PageError::failed(DOWNLOAD_FAILED_MESSAGE, e))
            }
        }
    }

    async fn save_rendition(&self, url: &str, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        let bytes = self.client.fetch_rendition(url).await?;
        let target = dest_dir.join(download_file_name(name));
        let dir = dest_dir.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let mut temp = NamedTempFile::new_in(&dir)
                .with_context(|| format!("Failed to create file in {}", dir.display()))?;
            temp.write_all(&bytes).context("Failed to write rendition")?;
            temp.persist(&target)
                .with_context(|| format!("Failed to save {}", target.display()))?;
            Ok(target)
        })
        .await
        .context("Download task failed")?
    }
}

impl<R: ImageRecipe> Page<R> {
    /// Validate and upload an image; on success the page holds its content identifier
    pub async fn upload_image(&mut self, file: &LocalFile) -> Result<ContentId, PageError> {
        self.session.select_file(file.selected.clone())?;

        let response = match self
            .client
            .upload_image(&file.path, &file.selected.content_type)
            .await
        {
            Ok(response) => response,
            Err(e) => return Err(self.upload_failed(IMAGE_UPLOAD_FAILED_MESSAGE, e)),
        };

        self.session.upload_succeeded(response.public_id.clone())?;
        tracing::info!(public_id = %response.public_id, "Image uploaded");
        Ok(response.public_id)
    }
}

impl Page<BackgroundRemoval> {
    pub fn background_removal(client: ApiClient, target: DeliveryTarget) -> Self {
        Self::new(client, UploadRule::IMAGE, BackgroundRemoval, target)
    }
}

impl Page<GenerativeBackground> {
    pub fn generative_background(client: ApiClient, target: DeliveryTarget) -> Self {
        Self::new(
            client,
            UploadRule::IMAGE,
            GenerativeBackground::default(),
            target,
        )
    }

    /// Replace the background using `prompt`; returns the new rendition URL
    pub async fn apply_prompt(&mut self, prompt: &str) -> Result<String, PageError> {
        self.transform(
            |recipe| {
                recipe.set_draft(prompt);
                recipe.apply()
            },
            GENERATE_FAILED_MESSAGE,
        )
        .await
    }
}

impl Page<SocialShare> {
    pub fn social_share(client: ApiClient, target: DeliveryTarget) -> Self {
        Self::new(client, UploadRule::IMAGE, SocialShare::default(), target)
    }

    /// Crop to another social format; returns the new rendition URL
    pub async fn select_format(&mut self, format: SocialFormat) -> Result<String, PageError> {
        self.transform(
            |recipe| {
                recipe.select(format);
                Ok(())
            },
            TRANSFORM_FAILED_MESSAGE,
        )
        .await
    }
}

impl Page<VideoPreview> {
    pub fn video_upload(client: ApiClient, target: DeliveryTarget) -> Self {
        Self::new(client, UploadRule::VIDEO, VideoPreview, target)
    }

    /// Validate and ingest a video with its metadata
    pub async fn upload_video(
        &mut self,
        file: &LocalFile,
        title: &str,
        description: &str,
    ) -> Result<VideoResponse, PageError> {
        self.session.select_file(file.selected.clone())?;

        let video = match self
            .client
            .upload_video(
                &file.path,
                &file.selected.content_type,
                title,
                description,
            )
            .await
        {
            Ok(video) => video,
            Err(e) => return Err(self.upload_failed(VIDEO_UPLOAD_FAILED_MESSAGE, e)),
        };

        self.session
            .upload_succeeded(ContentId::new(video.public_id.clone()))?;
        tracing::info!(video_id = %video.id, public_id = %video.public_id, "Video uploaded");
        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Auth;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::new(server.url(), Auth::Bearer("tok_123".to_string())).unwrap()
    }

    fn target_for(server: &mockito::ServerGuard) -> DeliveryTarget {
        DeliveryTarget::new(server.url(), "demo")
    }

    fn local_file(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> LocalFile {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        LocalFile::open(path).unwrap()
    }

    async fn mock_image_upload(
        server: &mut mockito::ServerGuard,
        public_id: &str,
    ) -> mockito::Mock {
        server
            .mock("POST", "/api/image-upload")
            .with_status(200)
            .with_body(serde_json::json!({ "publicId": public_id }).to_string())
            .create_async()
            .await
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/photo.PNG")), "image/png");
        assert_eq!(guess_content_type(Path::new("clip.mov")), "video/quicktime");
        assert_eq!(
            guess_content_type(Path::new("notes")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_download_file_name_stays_in_directory() {
        assert_eq!(
            download_file_name("next-cloudinary-uploads/abc_background_removed.png"),
            "next-cloudinary-uploads_abc_background_removed.png"
        );
    }

    #[tokio::test]
    async fn test_invalid_file_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/image-upload")
            .expect(0)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "notes.txt", b"hello");

        let mut page =
            BackgroundRemovalPage::background_removal(client_for(&server), target_for(&server));
        let err = page.upload_image(&file).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, PageError::Session(SessionError::Invalid(_))));
        assert_eq!(page.session().state().name(), "idle");
        assert_eq!(
            page.session().error(),
            Some("Please select a valid image file")
        );
    }

    #[tokio::test]
    async fn test_background_removal_upload_and_download() {
        let mut server = mockito::Server::new_async().await;
        let _upload = mock_image_upload(&mut server, "next-cloudinary-uploads/abc").await;
        let rendition = server
            .mock(
                "GET",
                "/demo/image/upload/e_background_removal/next-cloudinary-uploads/abc.png",
            )
            .with_status(200)
            .with_body("rendered png")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");
        let out = tempfile::tempdir().unwrap();

        let mut page =
            BackgroundRemovalPage::background_removal(client_for(&server), target_for(&server));
        let id = page.upload_image(&file).await.unwrap();
        assert_eq!(id.as_str(), "next-cloudinary-uploads/abc");
        assert_eq!(page.session().state().name(), "ready");

        let path = page.download(out.path()).await.unwrap();

        rendition.assert_async().await;
        assert_eq!(
            path,
            out.path()
                .join("next-cloudinary-uploads_abc_background_removed.png")
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"rendered png");
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 1);
        assert_eq!(page.session().state().name(), "ready");
    }

    #[tokio::test]
    async fn test_upload_failure_shows_server_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/image-upload")
            .with_status(500)
            .with_body(r#"{"error":"Upload image failed","code":"MEDIA_SERVICE_ERROR"}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");

        let mut page = SocialSharePage::social_share(client_for(&server), target_for(&server));
        let err = page.upload_image(&file).await.unwrap_err();

        assert_eq!(err.to_string(), "Upload image failed");
        assert_eq!(page.session().state().name(), "idle");
        assert_eq!(page.session().error(), Some("Upload image failed"));
    }

    #[tokio::test]
    async fn test_download_failure_keeps_upload() {
        let mut server = mockito::Server::new_async().await;
        let _upload = mock_image_upload(&mut server, "img").await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/demo/image/upload/".to_string()))
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");
        let out = tempfile::tempdir().unwrap();

        let mut page =
            BackgroundRemovalPage::background_removal(client_for(&server), target_for(&server));
        page.upload_image(&file).await.unwrap();
        let err = page.download(out.path()).await.unwrap_err();

        assert_eq!(err.to_string(), DOWNLOAD_FAILED_MESSAGE);
        assert_eq!(page.session().error(), Some(DOWNLOAD_FAILED_MESSAGE));
        assert!(page.session().content_id().is_some());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generative_prompt_is_sanitized() {
        let mut server = mockito::Server::new_async().await;
        let _upload = mock_image_upload(&mut server, "img").await;
        let rendition = server
            .mock(
                "GET",
                Matcher::Regex(
                    "e_gen_background_replace:prompt_Sunset.*beach2024/img\\.png$".to_string(),
                ),
            )
            .with_status(200)
            .with_body("rendered")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");

        let mut page = GenerativeBackgroundPage::generative_background(
            client_for(&server),
            target_for(&server),
        );
        page.upload_image(&file).await.unwrap();
        let url = page.apply_prompt("Sunset! @beach#2024").await.unwrap();

        rendition.assert_async().await;
        assert!(url.ends_with("e_gen_background_replace:prompt_Sunset%20beach2024/img.png"));
        assert_eq!(page.session().current_url(), Some(url));
        assert_eq!(page.session().state().name(), "ready");
    }

    #[tokio::test]
    async fn test_generative_render_failure() {
        let mut server = mockito::Server::new_async().await;
        let _upload = mock_image_upload(&mut server, "img").await;
        let _mock = server
            .mock("GET", Matcher::Regex("^/demo/image/upload/".to_string()))
            .with_status(400)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");

        let mut page = GenerativeBackgroundPage::generative_background(
            client_for(&server),
            target_for(&server),
        );
        page.upload_image(&file).await.unwrap();
        let err = page.apply_prompt("neon city").await.unwrap_err();

        assert_eq!(err.to_string(), GENERATE_FAILED_MESSAGE);
        assert_eq!(page.session().state().name(), "ready");
    }

    #[tokio::test]
    async fn test_empty_prompt_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let _upload = mock_image_upload(&mut server, "img").await;
        let rendition = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");

        let mut page = GenerativeBackgroundPage::generative_background(
            client_for(&server),
            target_for(&server),
        );
        page.upload_image(&file).await.unwrap();
        let err = page.apply_prompt("  !!  ").await.unwrap_err();

        rendition.assert_async().await;
        assert!(matches!(err, PageError::Session(SessionError::EmptyPrompt)));
    }

    #[tokio::test]
    async fn test_social_format_switch_downloads_new_crop() {
        let mut server = mockito::Server::new_async().await;
        let _upload = mock_image_upload(&mut server, "img").await;
        let rendition = server
            .mock(
                "GET",
                "/demo/image/upload/c_fill,w_1500,h_500,ar_3:1,g_auto/img.png",
            )
            .with_status(200)
            .with_body("header crop")
            .expect(2)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "photo.png", b"fake png bytes");
        let out = tempfile::tempdir().unwrap();

        let mut page = SocialSharePage::social_share(client_for(&server), target_for(&server));
        page.upload_image(&file).await.unwrap();
        let twitter = SocialFormat::by_name("Twitter Header (3:1)").unwrap();
        page.select_format(twitter).await.unwrap();
        let path = page.download(out.path()).await.unwrap();

        rendition.assert_async().await;
        assert_eq!(path, out.path().join("twitter_header_(3:1).png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"header crop");
    }

    #[tokio::test]
    async fn test_video_page_exposes_preview() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/video-upload")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "id": "6f1c7a52-1a0e-4a8f-9a8b-2f5d2d6f8c10",
                    "title": "Teaser",
                    "description": "",
                    "publicId": "video-uploads/teaser",
                    "originalSize": 4,
                    "compressedSize": 500000,
                    "duration": 12.5,
                    "createdAt": "2025-01-01T00:00:00Z",
                    "updatedAt": "2025-01-01T00:00:00Z"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "teaser.mp4", b"clip");

        let mut page = VideoUploadPage::video_upload(client_for(&server), target_for(&server));
        let video = page.upload_video(&file, "Teaser", "").await.unwrap();

        assert_eq!(video.compressed_size, 500_000);
        assert_eq!(
            page.session().current_url().unwrap(),
            format!(
                "{}/demo/video/upload/c_pad,w_1280,h_720/video-uploads/teaser.mp4",
                server.url()
            )
        );
        assert_eq!(
            page.session().download_name().unwrap(),
            "video-uploads/teaser_preview.mp4"
        );
    }

    #[tokio::test]
    async fn test_video_upload_failure_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/video-upload")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = local_file(&dir, "teaser.mp4", b"clip");

        let mut page = VideoUploadPage::video_upload(client_for(&server), target_for(&server));
        page.upload_video(&file, "", "").await.unwrap_err();

        // the raw body has no error field, so it is shown as-is
        assert_eq!(page.session().error(), Some("bad gateway"));
        assert_eq!(page.session().state().name(), "idle");
    }
}
