use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::Method,
    Json,
};
use framely_core::models::NewVideo;
use framely_core::{AppError, VideoResponse};
use framely_services::UploadRequest;

use crate::auth::RequestIdentity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::read_video_form;

/// Upload video handler
///
/// Spools the `file` field to disk, streams it to the media service (which queues the
/// 1280x720 padded preview asynchronously) and, once the upload is confirmed, stores one
/// Video Record. A failed database write leaves the remote asset in place.
#[utoipa::path(
    post,
    path = "/api/video-upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video uploaded and recorded", body = VideoResponse),
        (status = 400, description = "Video file missing", body = ErrorResponse),
        (status = 401, description = "No verified session", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Form parsing or upload failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %identity.user_id, operation = "upload_video")
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    identity: RequestIdentity,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let form = read_video_form(multipart).await?;
    let spooled = form
        .file
        .ok_or_else(|| AppError::BadRequest("Video file missing".to_string()))?;

    let request = UploadRequest::video(
        state.media.video_folder.clone(),
        spooled.file.path(),
        spooled.file_name.clone(),
    );
    let asset = state
        .media
        .service
        .upload(request)
        .await
        .map_err(|e| AppError::media_service("Cloudinary upload failed", e))?;

    let new_video = NewVideo {
        title: form.title,
        description: form.description,
        public_id: asset.public_id,
        original_size: i64::try_from(spooled.size).unwrap_or(i64::MAX),
        compressed_size: i64::try_from(asset.bytes).unwrap_or(i64::MAX),
        duration: asset.duration.unwrap_or(0.0),
    };
    drop(spooled);

    let video = state.db.videos.create(new_video).await.map_err(|e| {
        tracing::error!(error = %e, "Video uploaded but its record could not be stored");
        e
    })?;

    tracing::info!(
        video_id = %video.id,
        public_id = %video.public_id,
        original_size = video.original_size,
        compressed_size = video.compressed_size,
        duration = video.duration,
        "Video uploaded"
    );

    Ok(Json(VideoResponse::from(video)))
}

/// Any method other than POST on the video ingest route
pub async fn method_not_allowed(method: Method) -> HttpAppError {
    HttpAppError(AppError::MethodNotAllowed(method.to_string()))
}
