//! Framely Services Layer
//!
//! Clients for the external Media Transformation Service. Handlers depend on the
//! `MediaService` trait; `CloudinaryClient` is the production implementation.

pub mod cloudinary;
pub mod media;

pub use cloudinary::CloudinaryClient;
pub use media::{
    EagerTransform, MediaService, MediaServiceError, UploadRequest, UploadSource, UploadedAsset,
};
