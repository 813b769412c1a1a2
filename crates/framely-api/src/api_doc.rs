//! OpenAPI documentation, served at `/api/openapi.json`

use utoipa::OpenApi;

use crate::auth::SessionResponse;
use crate::error::ErrorResponse;
use crate::handlers;
use framely_core::{ImageUploadResponse, VideoResponse};

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Framely API",
        version = "0.1.0",
        description = "Upload proxy and video ingest for Framely. Assets are stored and transformed by the media service; renditions are fetched from its delivery URLs."
    ),
    paths(
        handlers::image_upload::upload_image,
        handlers::video_upload::upload_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::session::get_session,
    ),
    components(
        schemas(
            ImageUploadResponse,
            VideoResponse,
            SessionResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "images", description = "Image upload proxy"),
        (name = "videos", description = "Video ingest and Video Records"),
        (name = "session", description = "Signed-in identity")
    )
)]
pub struct ApiDoc;
