#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use framely_api::auth::{AuthState, JwtVerifier};
use framely_api::setup::routes::build_router;
use framely_api::{AppState, DbState, MediaState};
use framely_core::config::AuthConfig;
use framely_core::models::{NewVideo, Video};
use framely_core::{AppError, BaseConfig, CloudinaryConfig, Config, FramelyConfig, MediaKind};
use framely_db::VideoStore;
use framely_services::{
    MediaService, MediaServiceError, UploadRequest, UploadSource, UploadedAsset,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const JWT_SECRET: &str = "framely-test-secret-of-at-least-32-chars";

/// What the fake media service was asked to upload
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub kind: MediaKind,
    pub folder: String,
    pub eager: Vec<String>,
    pub eager_async: bool,
    pub file_name: String,
    pub content: Vec<u8>,
}

pub struct FakeMediaService {
    pub uploads: Mutex<Vec<RecordedUpload>>,
    pub fail: bool,
    pub bytes: u64,
    pub duration: Option<f64>,
}

impl FakeMediaService {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: false,
            bytes: 500_000,
            duration: Some(12.5),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaService for FakeMediaService {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedAsset, MediaServiceError> {
        let content = match &request.source {
            UploadSource::Bytes { data, .. } => data.to_vec(),
            UploadSource::File { path, .. } => std::fs::read(path)?,
        };
        let file_stem = request
            .source
            .file_name()
            .split('.')
            .next()
            .unwrap_or("asset")
            .to_string();

        self.uploads.lock().unwrap().push(RecordedUpload {
            kind: request.kind,
            folder: request.folder.clone(),
            eager: request.eager.iter().map(|e| e.directive()).collect(),
            eager_async: request.eager_async,
            file_name: request.source.file_name().to_string(),
            content,
        });

        if self.fail {
            return Err(MediaServiceError::Rejected {
                status: 401,
                message: "Invalid Signature 5f2b9c".to_string(),
            });
        }

        Ok(UploadedAsset {
            public_id: format!("{}/{}", request.folder, file_stem),
            bytes: self.bytes,
            duration: self.duration,
            format: None,
            secure_url: None,
            width: None,
            height: None,
        })
    }
}

#[derive(Default)]
pub struct FakeVideoStore {
    pub videos: Mutex<Vec<Video>>,
    pub fail_writes: bool,
    pub unreachable: bool,
}

impl FakeVideoStore {
    pub fn stored(&self) -> Vec<Video> {
        self.videos.lock().unwrap().clone()
    }

    pub fn seed(&self, title: &str, created_at: chrono::DateTime<Utc>) -> Video {
        let video = Video {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            public_id: format!("video-uploads/{}", title),
            original_size: 1_000,
            compressed_size: 800,
            duration: 3.0,
            created_at,
            updated_at: created_at,
        };
        self.videos.lock().unwrap().push(video.clone());
        video
    }
}

#[async_trait]
impl VideoStore for FakeVideoStore {
    async fn create(&self, video: NewVideo) -> Result<Video, AppError> {
        if self.fail_writes {
            return Err(AppError::from(sqlx::Error::PoolTimedOut));
        }
        let now = Utc::now();
        let stored = Video {
            id: Uuid::new_v4(),
            title: video.title,
            description: video.description,
            public_id: video.public_id,
            original_size: video.original_size,
            compressed_size: video.compressed_size,
            duration: video.duration,
            created_at: now,
            updated_at: now,
        };
        self.videos.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self
            .videos
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Video>, AppError> {
        let mut videos = self.stored();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.unreachable {
            return Err(AppError::from(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config(Box::new(FramelyConfig {
        base: BaseConfig {
            server_port: 0,
            environment: "test".to_string(),
            database_url: "postgres://localhost/framely_test".to_string(),
            db_max_connections: 1,
            db_timeout_seconds: 1,
            cors_origins: vec!["*".to_string()],
            max_upload_size_mb: 100,
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "123456".to_string(),
            api_secret: "abcd".to_string(),
            api_base_url: "https://api.cloudinary.com".to_string(),
            delivery_base_url: "https://res.cloudinary.com".to_string(),
            image_upload_folder: "next-cloudinary-uploads".to_string(),
            video_upload_folder: "video-uploads".to_string(),
        },
        auth: AuthConfig {
            jwt_secret: Some(JWT_SECRET.to_string()),
            ..AuthConfig::default()
        },
    }))
}

/// Test application around in-memory fakes
pub struct TestApp {
    pub server: TestServer,
    pub media: Arc<FakeMediaService>,
    pub videos: Arc<FakeVideoStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn setup_test_app_with(media: FakeMediaService, videos: FakeVideoStore) -> TestApp {
    let config = test_config();
    let media = Arc::new(media);
    let videos = Arc::new(videos);

    let state = Arc::new(AppState::new(
        config.clone(),
        MediaState {
            service: media.clone(),
            image_folder: config.cloudinary().image_upload_folder.clone(),
            video_folder: config.cloudinary().video_upload_folder.clone(),
        },
        DbState {
            videos: videos.clone(),
        },
    ));

    let router = build_router(
        &config,
        state,
        AuthState::new(JwtVerifier::with_secret(JWT_SECRET)),
    )
    .expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        media,
        videos,
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(FakeMediaService::new(), FakeVideoStore::default())
}

/// Session token for `user_id`, valid for an hour
pub fn session_token(user_id: &str) -> String {
    session_token_expiring(user_id, Utc::now().timestamp() + 3600)
}

pub fn session_token_expiring(user_id: &str, exp: i64) -> String {
    encode(
        &Header::default(),
        &serde_json::json!({
            "sub": user_id,
            "sid": "sess_test",
            "exp": exp,
            "iat": Utc::now().timestamp(),
        }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign session token")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
