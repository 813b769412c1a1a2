//! Application state
//!
//! Split into sub-states so each handler reaches only what it needs: the media service
//! and its upload folders, and the Video Record store.

use framely_core::Config;
use framely_db::VideoStore;
use framely_services::MediaService;
use std::sync::Arc;

/// Media service client plus the logical folders uploads land in
#[derive(Clone)]
pub struct MediaState {
    pub service: Arc<dyn MediaService>,
    pub image_folder: String,
    pub video_folder: String,
}

#[derive(Clone)]
pub struct DbState {
    pub videos: Arc<dyn VideoStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub media: MediaState,
    pub db: DbState,
}

impl AppState {
    pub fn new(config: Config, media: MediaState, db: DbState) -> Self {
        Self { config, media, db }
    }
}
