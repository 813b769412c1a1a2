//! Configuration module
//!
//! Server configuration loaded from the environment (and an optional `.env` file):
//! HTTP and database settings, the Cloudinary account used for uploads and delivery,
//! and the session-token verification settings of the identity provider.

use std::env;
use std::fmt;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 100;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";
pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";
pub const DEFAULT_IMAGE_FOLDER: &str = "next-cloudinary-uploads";
pub const DEFAULT_VIDEO_FOLDER: &str = "video-uploads";

/// HTTP server and database settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub cors_origins: Vec<String>,
    pub max_upload_size_mb: usize,
}

/// Cloudinary account used for signed uploads and rendition delivery
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base_url: String,
    pub delivery_base_url: String,
    pub image_upload_folder: String,
    pub video_upload_folder: String,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("delivery_base_url", &self.delivery_base_url)
            .field("image_upload_folder", &self.image_upload_folder)
            .field("video_upload_folder", &self.video_upload_folder)
            .finish()
    }
}

/// Session token verification settings
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// JWKS endpoint of the identity provider (RS256/ES256 tokens)
    pub jwks_url: Option<String>,
    /// Shared secret for HS256 tokens
    pub jwt_secret: Option<String>,
    /// Expected `iss` claim
    pub issuer: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwks_url", &self.jwks_url)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct FramelyConfig {
    pub base: BaseConfig,
    pub cloudinary: CloudinaryConfig,
    pub auth: AuthConfig,
}

fn required(name: &str) -> Result<String, anyhow::Error> {
    env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl FramelyConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            environment,
            database_url: required("DATABASE_URL")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            cors_origins,
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
                .parse()
                .unwrap_or(MAX_UPLOAD_SIZE_MB),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .or_else(|_| env::var("NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME"))
                .map_err(|_| anyhow::anyhow!("CLOUDINARY_CLOUD_NAME must be set"))?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            api_base_url: env::var("CLOUDINARY_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            delivery_base_url: env::var("CLOUDINARY_DELIVERY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_DELIVERY_BASE_URL.to_string()),
            image_upload_folder: env::var("IMAGE_UPLOAD_FOLDER")
                .unwrap_or_else(|_| DEFAULT_IMAGE_FOLDER.to_string()),
            video_upload_folder: env::var("VIDEO_UPLOAD_FOLDER")
                .unwrap_or_else(|_| DEFAULT_VIDEO_FOLDER.to_string()),
        };

        let auth = AuthConfig {
            jwks_url: optional("AUTH_JWKS_URL"),
            jwt_secret: optional("AUTH_JWT_SECRET"),
            issuer: optional("AUTH_ISSUER"),
        };

        Ok(FramelyConfig {
            base,
            cloudinary,
            auth,
        })
    }

    /// Validate configuration at startup (fail fast on misconfiguration)
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let is_production = matches!(
            self.base.environment.to_lowercase().as_str(),
            "production" | "prod"
        );
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !self.base.database_url.starts_with("postgres://")
            && !self.base.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a PostgreSQL connection string (postgres://...)"
            ));
        }

        if self.base.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        if self.base.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.cloudinary.cloud_name.trim().is_empty() {
            return Err(anyhow::anyhow!("CLOUDINARY_CLOUD_NAME must not be empty"));
        }
        if self.cloudinary.api_key.trim().is_empty() || self.cloudinary.api_secret.trim().is_empty()
        {
            return Err(anyhow::anyhow!(
                "CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must not be empty"
            ));
        }
        for (name, url) in [
            ("CLOUDINARY_API_BASE_URL", &self.cloudinary.api_base_url),
            (
                "CLOUDINARY_DELIVERY_BASE_URL",
                &self.cloudinary.delivery_base_url,
            ),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
            }
        }

        if self.auth.jwks_url.is_none() && self.auth.jwt_secret.is_none() {
            return Err(anyhow::anyhow!(
                "Either AUTH_JWKS_URL or AUTH_JWT_SECRET must be set for authentication"
            ));
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.len() < 32 {
                return Err(anyhow::anyhow!(
                    "AUTH_JWT_SECRET must be at least 32 characters long"
                ));
            }
        }

        Ok(())
    }
}

/// Application configuration handle shared by the server components
#[derive(Clone, Debug)]
pub struct Config(pub Box<FramelyConfig>);

impl Config {
    fn inner(&self) -> &FramelyConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = FramelyConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(
            self.inner().base.environment.to_lowercase().as_str(),
            "production" | "prod"
        )
    }

    // Convenience getters
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().base.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().base.max_upload_size_mb * 1024 * 1024
    }

    pub fn cloudinary(&self) -> &CloudinaryConfig {
        &self.inner().cloudinary
    }

    pub fn auth(&self) -> &AuthConfig {
        &self.inner().auth
    }
}
