//! Rendition URL builder
//!
//! Builds media service delivery URLs of the form
//! `<delivery_base>/<cloud_name>/<resource_type>/upload/<directives>/<public_id>.<ext>`.
//! Effects come first, each as its own path segment; crop, size, aspect ratio and gravity
//! are emitted together as one comma-separated segment in that order.

use serde::{Deserialize, Serialize};

use crate::models::{ContentId, MediaKind};

/// Where renditions are served from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    pub delivery_base_url: String,
    pub cloud_name: String,
}

impl DeliveryTarget {
    pub fn new(delivery_base_url: impl Into<String>, cloud_name: impl Into<String>) -> Self {
        Self {
            delivery_base_url: delivery_base_url.into(),
            cloud_name: cloud_name.into(),
        }
    }
}

/// Fluent builder for rendition URLs
///
/// # Example
///
/// ```rust
/// use framely_core::models::ContentId;
/// use framely_core::transform_url::{DeliveryTarget, TransformationUrlBuilder};
///
/// let target = DeliveryTarget::new("https://res.cloudinary.com", "demo");
/// let url = TransformationUrlBuilder::image()
///     .effect("e_background_removal")
///     .build(&target, &ContentId::new("sample"));
/// assert_eq!(
///     url,
///     "https://res.cloudinary.com/demo/image/upload/e_background_removal/sample.png"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct TransformationUrlBuilder {
    kind: MediaKind,
    extension: String,
    effects: Vec<String>,
    crop: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    aspect_ratio: Option<String>,
    gravity: Option<String>,
}

impl TransformationUrlBuilder {
    pub fn new(kind: MediaKind, extension: &str) -> Self {
        Self {
            kind,
            extension: extension.to_string(),
            effects: Vec::new(),
            crop: None,
            width: None,
            height: None,
            aspect_ratio: None,
            gravity: None,
        }
    }

    /// Image rendition delivered as PNG
    pub fn image() -> Self {
        Self::new(MediaKind::Image, "png")
    }

    /// Video rendition delivered as MP4
    pub fn video() -> Self {
        Self::new(MediaKind::Video, "mp4")
    }

    /// Append an effect directive (e.g. `e_background_removal`)
    pub fn effect(mut self, directive: impl Into<String>) -> Self {
        self.effects.push(directive.into());
        self
    }

    /// Set crop mode: "fill", "pad", ...
    pub fn crop(mut self, mode: &str) -> Self {
        self.crop = Some(mode.to_string());
        self
    }

    /// Set both width and height
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set aspect ratio, e.g. "16:9"
    pub fn aspect_ratio(mut self, ratio: &str) -> Self {
        self.aspect_ratio = Some(ratio.to_string());
        self
    }

    /// Set gravity, e.g. "auto"
    pub fn gravity(mut self, gravity: &str) -> Self {
        self.gravity = Some(gravity.to_string());
        self
    }

    /// Directive path segments in delivery order
    pub fn build_operations(&self) -> String {
        let mut operations = self.effects.clone();

        let mut sizing = Vec::new();
        if let Some(ref crop) = self.crop {
            sizing.push(format!("c_{}", crop));
        }
        if let Some(width) = self.width {
            sizing.push(format!("w_{}", width));
        }
        if let Some(height) = self.height {
            sizing.push(format!("h_{}", height));
        }
        if let Some(ref ratio) = self.aspect_ratio {
            sizing.push(format!("ar_{}", ratio));
        }
        if let Some(ref gravity) = self.gravity {
            sizing.push(format!("g_{}", gravity));
        }
        if !sizing.is_empty() {
            operations.push(sizing.join(","));
        }

        operations.join("/")
    }

    /// Build the full delivery URL for a content identifier
    pub fn build(&self, target: &DeliveryTarget, public_id: &ContentId) -> String {
        let base = target.delivery_base_url.trim_end_matches('/');
        let operations = self.build_operations();
        if operations.is_empty() {
            format!(
                "{}/{}/{}/upload/{}.{}",
                base,
                target.cloud_name,
                self.kind.resource_type(),
                public_id,
                self.extension
            )
        } else {
            format!(
                "{}/{}/{}/upload/{}/{}.{}",
                base,
                target.cloud_name,
                self.kind.resource_type(),
                operations,
                public_id,
                self.extension
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> DeliveryTarget {
        DeliveryTarget::new("https://res.cloudinary.com/", "demo")
    }

    #[test]
    fn test_plain_delivery_url() {
        let url = TransformationUrlBuilder::image().build(&target(), &ContentId::new("cat"));
        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/cat.png");
    }

    #[test]
    fn test_social_crop_order() {
        let url = TransformationUrlBuilder::image()
            .crop("fill")
            .dimensions(1200, 675)
            .aspect_ratio("16:9")
            .gravity("auto")
            .build(&target(), &ContentId::new("folder/cat"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/c_fill,w_1200,h_675,ar_16:9,g_auto/folder/cat.png"
        );
    }

    #[test]
    fn test_video_pad_preview() {
        let url = TransformationUrlBuilder::video()
            .crop("pad")
            .dimensions(1280, 720)
            .build(&target(), &ContentId::new("video-uploads/clip"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/video/upload/c_pad,w_1280,h_720/video-uploads/clip.mp4"
        );
    }

    #[test]
    fn test_effects_precede_sizing() {
        let builder = TransformationUrlBuilder::image()
            .effect("e_background_removal")
            .crop("fill")
            .dimensions(100, 100);
        assert_eq!(
            builder.build_operations(),
            "e_background_removal/c_fill,w_100,h_100"
        );
    }
}
