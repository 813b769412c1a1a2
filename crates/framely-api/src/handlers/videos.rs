use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use framely_core::{AppError, VideoResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListVideosQuery {
    /// Page size (1-100, default 50)
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListVideosQuery {
    fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Video Records, newest first
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "Video Records", body = Vec<VideoResponse>),
        (status = 401, description = "No verified session", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListVideosQuery>,
) -> Result<Json<Vec<VideoResponse>>, HttpAppError> {
    let (limit, offset) = query.bounds();
    let videos = state.db.videos.list(limit, offset).await?;
    Ok(Json(videos.into_iter().map(VideoResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video Record ID")),
    responses(
        (status = 200, description = "Video Record", body = VideoResponse),
        (status = 401, description = "No verified session", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video = state
        .db
        .videos
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    Ok(Json(VideoResponse::from(video)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_bounds() {
        let query = ListVideosQuery {
            limit: None,
            offset: None,
        };
        assert_eq!(query.bounds(), (50, 0));

        let query = ListVideosQuery {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(query.bounds(), (100, 0));

        let query = ListVideosQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!(query.bounds(), (1, 20));
    }
}
