pub mod media;
pub mod video;

pub use media::{ContentId, ImageUploadResponse, MediaKind};
pub use video::{NewVideo, Video, VideoResponse};
