use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::media::ContentId;

/// Persisted metadata for one ingested video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub public_id: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn content_id(&self) -> ContentId {
        ContentId::new(self.public_id.clone())
    }
}

/// Values for a new video row, assembled once the media service confirmed the upload
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub public_id: String,
    pub original_size: i64,
    pub compressed_size: i64,
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub public_id: String,
    /// Size of the file as uploaded, in bytes
    pub original_size: i64,
    /// Size reported by the media service, in bytes
    pub compressed_size: i64,
    /// Duration in seconds (0 when unknown)
    pub duration: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        VideoResponse {
            id: video.id,
            title: video.title,
            description: video.description,
            public_id: video.public_id,
            original_size: video.original_size,
            compressed_size: video.compressed_size,
            duration: video.duration,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_camel_case() {
        let now = Utc::now();
        let response = VideoResponse::from(Video {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            description: String::new(),
            public_id: "video-uploads/launch".to_string(),
            original_size: 1_000_000,
            compressed_size: 500_000,
            duration: 12.5,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["publicId"], "video-uploads/launch");
        assert_eq!(json["compressedSize"], 500_000);
        assert_eq!(json["duration"], 12.5);
        assert!(json.get("createdAt").is_some());
    }
}
