use async_trait::async_trait;
use framely_core::models::{NewVideo, Video};
use framely_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const VIDEO_COLUMNS: &str = "id, title, description, public_id, original_size, compressed_size, duration, created_at, updated_at";

/// Persistence of Video Records
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert one record and return it as stored
    async fn create(&self, video: NewVideo) -> Result<Video, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Records newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Video>, AppError>;

    /// Round trip to the store, used by the readiness probe
    async fn ping(&self) -> Result<(), AppError>;
}

/// Repository for the `videos` table
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", video.public_id = %video.public_id))]
    async fn create(&self, video: NewVideo) -> Result<Video, AppError> {
        let query = format!(
            r#"
            INSERT INTO videos (id, title, description, public_id, original_size, compressed_size, duration)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        );

        let stored = sqlx::query_as::<Postgres, Video>(&query)
            .bind(Uuid::new_v4())
            .bind(&video.title)
            .bind(&video.description)
            .bind(&video.public_id)
            .bind(video.original_size)
            .bind(video.compressed_size)
            .bind(video.duration)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(video_id = %stored.id, "Video record created");
        Ok(stored)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let query = format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS);
        let video = sqlx::query_as::<Postgres, Video>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Video>, AppError> {
        let query = format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            VIDEO_COLUMNS
        );
        let videos = sqlx::query_as::<Postgres, Video>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(videos)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
