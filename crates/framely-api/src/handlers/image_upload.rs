use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use framely_core::{AppError, ContentId, ImageUploadResponse};
use framely_services::UploadRequest;

use crate::auth::RequestIdentity;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::extract_image_file;

const UPLOAD_FAILED: &str = "Upload image failed";

/// Upload image handler
///
/// Forwards the `file` field to the media service under the image folder and returns
/// the content identifier it assigned. Upstream failures are logged and reported with a
/// generic message; nothing is retried.
#[utoipa::path(
    post,
    path = "/api/image-upload",
    tag = "images",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image uploaded", body = ImageUploadResponse),
        (status = 400, description = "No file field in the form", body = ErrorResponse),
        (status = 401, description = "No verified session", body = ErrorResponse),
        (status = 500, description = "Upload image failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %identity.user_id, operation = "upload_image")
)]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    identity: RequestIdentity,
    multipart: Multipart,
) -> Result<Json<ImageUploadResponse>, HttpAppError> {
    let file = extract_image_file(multipart)
        .await
        .map_err(|e| AppError::media_service(UPLOAD_FAILED, e))?
        .ok_or_else(|| AppError::BadRequest("File not found".to_string()))?;

    tracing::debug!(
        file_name = %file.file_name,
        content_type = %file.content_type,
        size = file.data.len(),
        "Forwarding image to media service"
    );

    let request = UploadRequest::image(state.media.image_folder.clone(), file.data, file.file_name);
    let asset = state
        .media
        .service
        .upload(request)
        .await
        .map_err(|e| AppError::media_service(UPLOAD_FAILED, e))?;

    tracing::info!(public_id = %asset.public_id, "Image uploaded");

    Ok(Json(ImageUploadResponse {
        public_id: ContentId::new(asset.public_id),
    }))
}
