//! Upload session state machine shared by every client page
//!
//! `Idle -> Uploading -> Ready -> (Transforming | Downloading) -> Ready`, and `reset`
//! returns to `Idle` from anywhere. A rendition URL can only be produced in states that
//! hold a `ContentId`, which only a successful upload supplies.

mod recipes;

pub use recipes::{BackgroundRemoval, GenerativeBackground, SocialShare, VideoPreview};

use crate::models::ContentId;
use crate::transform_url::DeliveryTarget;
use crate::validation::{SelectedFile, UploadRule, ValidationError};

pub const DOWNLOAD_FAILED_MESSAGE: &str = "Failed to download image. Please try again.";

/// How a page turns an uploaded asset into the rendition it displays and downloads
pub trait Rendition {
    /// Delivery URL of the rendition, or `None` while the recipe has nothing to render
    fn url(&self, target: &DeliveryTarget, id: &ContentId) -> Option<String>;

    /// File name offered for the downloaded rendition
    fn download_name(&self, id: &ContentId) -> String;

    /// Called once when an upload succeeds
    fn on_uploaded(&mut self) {}

    /// Called when the session is reset
    fn reset(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("An upload is already in progress")]
    Busy,

    #[error("Please upload a file first")]
    NotReady,

    #[error("Please upload an image and enter a prompt")]
    EmptyPrompt,

    #[error("Nothing to render yet")]
    NoRendition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Uploading {
        file: SelectedFile,
    },
    Ready {
        file: SelectedFile,
        content_id: ContentId,
    },
    Transforming {
        file: SelectedFile,
        content_id: ContentId,
    },
    Downloading {
        file: SelectedFile,
        content_id: ContentId,
        url: String,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Uploading { .. } => "uploading",
            SessionState::Ready { .. } => "ready",
            SessionState::Transforming { .. } => "transforming",
            SessionState::Downloading { .. } => "downloading",
        }
    }

    pub fn content_id(&self) -> Option<&ContentId> {
        match self {
            SessionState::Idle | SessionState::Uploading { .. } => None,
            SessionState::Ready { content_id, .. }
            | SessionState::Transforming { content_id, .. }
            | SessionState::Downloading { content_id, .. } => Some(content_id),
        }
    }
}

/// Page state: one selected file, at most one upload in flight, one displayed rendition
#[derive(Debug)]
pub struct UploadSession<R: Rendition> {
    rule: UploadRule,
    recipe: R,
    target: DeliveryTarget,
    state: SessionState,
    error: Option<String>,
}

impl<R: Rendition> UploadSession<R> {
    pub fn new(rule: UploadRule, recipe: R, target: DeliveryTarget) -> Self {
        Self {
            rule,
            recipe,
            target,
            state: SessionState::Idle,
            error: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Inline error shown to the user, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn recipe(&self) -> &R {
        &self.recipe
    }

    pub fn rule(&self) -> UploadRule {
        self.rule
    }

    pub fn content_id(&self) -> Option<&ContentId> {
        self.state.content_id()
    }

    fn holding(&self) -> Option<(SelectedFile, ContentId)> {
        match &self.state {
            SessionState::Ready { file, content_id }
            | SessionState::Transforming { file, content_id }
            | SessionState::Downloading {
                file, content_id, ..
            } => Some((file.clone(), content_id.clone())),
            _ => None,
        }
    }

    /// Validate a picked file and start uploading it
    ///
    /// Rejected while an upload is in flight. A file that fails the rule leaves the
    /// current state untouched and sets the inline error.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), SessionError> {
        if matches!(self.state, SessionState::Uploading { .. }) {
            return Err(SessionError::Busy);
        }

        if let Err(e) = self.rule.check(&file) {
            self.error = Some(e.to_string());
            return Err(e.into());
        }

        self.error = None;
        self.state = SessionState::Uploading { file };
        Ok(())
    }

    /// Record the content identifier returned by the upload proxy
    pub fn upload_succeeded(&mut self, content_id: ContentId) -> Result<(), SessionError> {
        let file = match &self.state {
            SessionState::Uploading { file } => file.clone(),
            _ => return Err(SessionError::NotReady),
        };
        self.recipe.on_uploaded();
        self.state = SessionState::Ready { file, content_id };
        Ok(())
    }

    pub fn upload_failed(&mut self, message: impl Into<String>) {
        if matches!(self.state, SessionState::Uploading { .. }) {
            self.state = SessionState::Idle;
        }
        self.error = Some(message.into());
    }

    /// Change the recipe and enter `Transforming` until the new rendition has rendered
    pub fn begin_transform<F>(&mut self, change: F) -> Result<String, SessionError>
    where
        F: FnOnce(&mut R) -> Result<(), SessionError>,
    {
        let (file, content_id) = match &self.state {
            SessionState::Ready { .. } | SessionState::Transforming { .. } => {
                self.holding().ok_or(SessionError::NotReady)?
            }
            SessionState::Downloading { .. } => return Err(SessionError::Busy),
            _ => return Err(SessionError::NotReady),
        };

        if let Err(e) = change(&mut self.recipe) {
            self.error = Some(e.to_string());
            return Err(e);
        }

        let url = self
            .recipe
            .url(&self.target, &content_id)
            .ok_or(SessionError::NoRendition)?;
        self.error = None;
        self.state = SessionState::Transforming { file, content_id };
        Ok(url)
    }

    pub fn finish_transform(&mut self) {
        if let SessionState::Transforming { file, content_id } = &self.state {
            self.state = SessionState::Ready {
                file: file.clone(),
                content_id: content_id.clone(),
            };
        }
    }

    pub fn transform_failed(&mut self, message: impl Into<String>) {
        self.finish_transform();
        self.error = Some(message.into());
    }

    /// URL of the rendition currently displayed
    pub fn current_url(&self) -> Option<String> {
        let content_id = self.state.content_id()?;
        self.recipe.url(&self.target, content_id)
    }

    pub fn download_name(&self) -> Option<String> {
        self.state
            .content_id()
            .map(|id| self.recipe.download_name(id))
    }

    /// Start downloading the displayed rendition; returns its URL and download name
    pub fn begin_download(&mut self) -> Result<(String, String), SessionError> {
        let (file, content_id) = match &self.state {
            SessionState::Ready { file, content_id } => (file.clone(), content_id.clone()),
            SessionState::Transforming { .. } | SessionState::Downloading { .. } => {
                return Err(SessionError::Busy)
            }
            _ => return Err(SessionError::NotReady),
        };

        let url = self
            .recipe
            .url(&self.target, &content_id)
            .ok_or(SessionError::NoRendition)?;
        let name = self.recipe.download_name(&content_id);
        self.state = SessionState::Downloading {
            file,
            content_id,
            url: url.clone(),
        };
        Ok((url, name))
    }

    pub fn finish_download(&mut self, succeeded: bool) {
        if let SessionState::Downloading {
            file, content_id, ..
        } = &self.state
        {
            self.state = SessionState::Ready {
                file: file.clone(),
                content_id: content_id.clone(),
            };
        }
        self.error = if succeeded {
            None
        } else {
            Some(DOWNLOAD_FAILED_MESSAGE.to_string())
        };
    }

    /// Drop the selected file and uploaded asset and return to `Idle`
    pub fn reset(&mut self) {
        self.recipe.reset();
        self.state = SessionState::Idle;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::SocialFormat;

    fn target() -> DeliveryTarget {
        DeliveryTarget::new("https://res.cloudinary.com", "demo")
    }

    fn png(size: u64) -> SelectedFile {
        SelectedFile::new("photo.png", "image/png", size)
    }

    #[test]
    fn test_no_url_before_upload_response() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        assert!(session.current_url().is_none());

        session.select_file(png(1024)).unwrap();
        assert_eq!(session.state().name(), "uploading");
        assert!(session.current_url().is_none());
        assert_eq!(session.begin_download(), Err(SessionError::NotReady));
    }

    #[test]
    fn test_url_contains_content_id_verbatim() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        session.select_file(png(1024)).unwrap();
        session
            .upload_succeeded(ContentId::new("next-cloudinary-uploads/x9_Ab"))
            .unwrap();

        let url = session.current_url().unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_background_removal/next-cloudinary-uploads/x9_Ab.png"
        );
        assert_eq!(
            session.download_name().unwrap(),
            "next-cloudinary-uploads/x9_Ab_background_removed.png"
        );
    }

    #[test]
    fn test_invalid_file_stays_idle() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        let err = session
            .select_file(SelectedFile::new("a.txt", "text/plain", 10))
            .unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.error(), Some("Please select a valid image file"));

        assert!(session.select_file(png(11 * 1024 * 1024)).is_err());
        assert_eq!(session.error(), Some("File size must be less than 10MB"));
    }

    #[test]
    fn test_single_upload_in_flight() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        session.select_file(png(10)).unwrap();
        assert_eq!(session.select_file(png(20)), Err(SessionError::Busy));
    }

    #[test]
    fn test_upload_failure_returns_to_idle() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        session.select_file(png(10)).unwrap();
        session.upload_failed("Upload image failed");
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.error(), Some("Upload image failed"));
    }

    #[test]
    fn test_switching_presets_never_reuses_dimensions() {
        let mut session =
            UploadSession::new(UploadRule::IMAGE, SocialShare::default(), target());
        session.select_file(png(10)).unwrap();
        session.upload_succeeded(ContentId::new("img")).unwrap();
        assert!(session.current_url().unwrap().contains("w_1080,h_1080,ar_1:1"));

        let twitter = SocialFormat::by_name("Twitter Header (3:1)").unwrap();
        let url = session
            .begin_transform(|recipe| {
                recipe.select(twitter);
                Ok(())
            })
            .unwrap();
        assert_eq!(session.state().name(), "transforming");
        assert!(url.contains("c_fill,w_1500,h_500,ar_3:1,g_auto"));
        assert!(!url.contains("1080"));

        // downloads wait for the rendition to settle
        assert_eq!(session.begin_download(), Err(SessionError::Busy));
        session.finish_transform();

        let (download_url, name) = session.begin_download().unwrap();
        assert_eq!(download_url, url);
        assert_eq!(name, "twitter_header_(3:1).png");
        session.finish_download(true);
        assert_eq!(session.state().name(), "ready");
    }

    #[test]
    fn test_generative_prompt_applied_on_upload_and_transform() {
        let mut session =
            UploadSession::new(UploadRule::IMAGE, GenerativeBackground::default(), target());
        session.select_file(png(10)).unwrap();
        session.upload_succeeded(ContentId::new("img")).unwrap();
        assert!(session
            .current_url()
            .unwrap()
            .contains("e_gen_background_replace:prompt_Minimalist%20background"));

        let url = session
            .begin_transform(|recipe| {
                recipe.set_draft("Sunset! @beach#2024");
                recipe.apply()
            })
            .unwrap();
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/e_gen_background_replace:prompt_Sunset%20beach2024/img.png"
        );
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let mut session =
            UploadSession::new(UploadRule::IMAGE, GenerativeBackground::default(), target());
        session.select_file(png(10)).unwrap();
        session.upload_succeeded(ContentId::new("img")).unwrap();
        let before = session.current_url();

        let err = session
            .begin_transform(|recipe| {
                recipe.set_draft("   ");
                recipe.apply()
            })
            .unwrap_err();
        assert_eq!(err, SessionError::EmptyPrompt);
        assert_eq!(session.state().name(), "ready");
        assert_eq!(session.current_url(), before);
    }

    #[test]
    fn test_download_failure_keeps_asset() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        session.select_file(png(10)).unwrap();
        session.upload_succeeded(ContentId::new("img")).unwrap();
        session.begin_download().unwrap();
        session.finish_download(false);
        assert_eq!(session.error(), Some(DOWNLOAD_FAILED_MESSAGE));
        assert!(session.content_id().is_some());
    }

    #[test]
    fn test_video_preview_rendition() {
        let mut session = UploadSession::new(UploadRule::VIDEO, VideoPreview, target());
        assert!(session
            .select_file(SelectedFile::new("a.png", "image/png", 10))
            .is_err());
        session
            .select_file(SelectedFile::new("clip.mp4", "video/mp4", 5 * 1024 * 1024))
            .unwrap();
        session
            .upload_succeeded(ContentId::new("video-uploads/clip"))
            .unwrap();
        assert_eq!(
            session.current_url().unwrap(),
            "https://res.cloudinary.com/demo/video/upload/c_pad,w_1280,h_720/video-uploads/clip.mp4"
        );
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut session = UploadSession::new(UploadRule::IMAGE, BackgroundRemoval, target());
        session.select_file(png(10)).unwrap();
        session.upload_succeeded(ContentId::new("img")).unwrap();
        session.reset();
        assert_eq!(session.state(), &SessionState::Idle);
        assert!(session.current_url().is_none());
        assert!(session.error().is_none());
    }
}
