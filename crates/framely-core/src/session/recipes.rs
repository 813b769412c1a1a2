use super::{Rendition, SessionError};
use crate::models::ContentId;
use crate::presets::SocialFormat;
use crate::prompt;
use crate::transform_url::{DeliveryTarget, TransformationUrlBuilder};

/// Background removal page
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundRemoval;

impl Rendition for BackgroundRemoval {
    fn url(&self, target: &DeliveryTarget, id: &ContentId) -> Option<String> {
        Some(
            TransformationUrlBuilder::image()
                .effect("e_background_removal")
                .build(target, id),
        )
    }

    fn download_name(&self, id: &ContentId) -> String {
        format!("{}_background_removed.png", id)
    }
}

/// Generative background page: an editable draft prompt and the prompt last applied
#[derive(Debug, Clone)]
pub struct GenerativeBackground {
    draft: String,
    applied: Option<String>,
}

impl Default for GenerativeBackground {
    fn default() -> Self {
        Self {
            draft: prompt::DEFAULT_PROMPT.to_string(),
            applied: None,
        }
    }
}

impl GenerativeBackground {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = prompt::clamp_draft(text);
    }

    /// Make the draft the rendered prompt
    pub fn apply(&mut self) -> Result<(), SessionError> {
        if prompt::background_replace_directive(&self.draft).is_none() {
            return Err(SessionError::EmptyPrompt);
        }
        self.applied = Some(self.draft.clone());
        Ok(())
    }
}

impl Rendition for GenerativeBackground {
    fn url(&self, target: &DeliveryTarget, id: &ContentId) -> Option<String> {
        let directive = prompt::background_replace_directive(self.applied.as_deref()?)?;
        Some(
            TransformationUrlBuilder::image()
                .effect(directive)
                .build(target, id),
        )
    }

    fn download_name(&self, id: &ContentId) -> String {
        format!("{}_generated_background.png", id)
    }

    fn on_uploaded(&mut self) {
        if prompt::background_replace_directive(&self.draft).is_some() {
            self.applied = Some(self.draft.clone());
        }
    }

    fn reset(&mut self) {
        self.applied = None;
    }
}

/// Social share page: crop to the selected social format
#[derive(Debug, Clone)]
pub struct SocialShare {
    format: SocialFormat,
}

impl Default for SocialShare {
    fn default() -> Self {
        Self {
            format: SocialFormat::default_format(),
        }
    }
}

impl SocialShare {
    pub fn new(format: SocialFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> SocialFormat {
        self.format
    }

    pub fn select(&mut self, format: SocialFormat) {
        self.format = format;
    }
}

impl Rendition for SocialShare {
    fn url(&self, target: &DeliveryTarget, id: &ContentId) -> Option<String> {
        Some(
            TransformationUrlBuilder::image()
                .crop("fill")
                .dimensions(self.format.width, self.format.height)
                .aspect_ratio(self.format.aspect_ratio)
                .gravity("auto")
                .build(target, id),
        )
    }

    fn download_name(&self, _id: &ContentId) -> String {
        self.format.file_name()
    }
}

/// Video upload page: the eager 1280x720 padded preview
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoPreview;

impl Rendition for VideoPreview {
    fn url(&self, target: &DeliveryTarget, id: &ContentId) -> Option<String> {
        Some(
            TransformationUrlBuilder::video()
                .crop("pad")
                .dimensions(1280, 720)
                .build(target, id),
        )
    }

    fn download_name(&self, id: &ContentId) -> String {
        format!("{}_preview.mp4", id)
    }
}
