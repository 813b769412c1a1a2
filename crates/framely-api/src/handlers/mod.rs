pub mod health;
pub mod image_upload;
pub mod session;
pub mod video_upload;
pub mod videos;
