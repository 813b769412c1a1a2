//! Service and repository wiring

use crate::state::{AppState, DbState, MediaState};
use anyhow::{Context, Result};
use framely_core::Config;
use framely_db::VideoRepository;
use framely_services::CloudinaryClient;
use sqlx::PgPool;
use std::sync::Arc;

pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let cloudinary = config.cloudinary();
    let client =
        CloudinaryClient::new(cloudinary).context("Failed to initialize Cloudinary client")?;
    tracing::info!(
        cloud_name = %client.cloud_name(),
        image_folder = %cloudinary.image_upload_folder,
        video_folder = %cloudinary.video_upload_folder,
        "Media service client initialized"
    );

    let media = MediaState {
        service: Arc::new(client),
        image_folder: cloudinary.image_upload_folder.clone(),
        video_folder: cloudinary.video_upload_folder.clone(),
    };
    let db = DbState {
        videos: Arc::new(VideoRepository::new(pool)),
    };

    Ok(Arc::new(AppState::new(config.clone(), media, db)))
}
