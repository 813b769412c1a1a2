//! Framely Core Library
//!
//! This crate provides the domain models, error types, configuration and client-side
//! rules (validation, prompt sanitization, social presets, rendition URLs and the
//! upload session state machine) shared across all Framely components.

pub mod config;
pub mod error;
pub mod models;
pub mod presets;
pub mod prompt;
pub mod session;
pub mod transform_url;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, CloudinaryConfig, Config, FramelyConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ContentId, ImageUploadResponse, MediaKind, Video, VideoResponse};
pub use presets::SocialFormat;
pub use session::{Rendition, SessionError, SessionState, UploadSession};
pub use transform_url::{DeliveryTarget, TransformationUrlBuilder};
pub use validation::{SelectedFile, UploadRule, ValidationError};
