//! Cloudinary upload client
//!
//! Uploads go to `POST <api_base>/v1_1/<cloud_name>/<resource_type>/upload` as multipart
//! forms signed with the account secret: the upload parameters are sorted by name, joined
//! as `k=v` pairs with `&`, suffixed with the secret and hashed with SHA-256.

use async_trait::async_trait;
use framely_core::config::CloudinaryConfig;
use framely_core::models::MediaKind;
use framely_core::transform_url::DeliveryTarget;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use tokio_util::io::ReaderStream;

use crate::media::{MediaService, MediaServiceError, UploadRequest, UploadSource, UploadedAsset};

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    error: CloudinaryErrorMessage,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorMessage {
    message: String,
}

/// Signed upload client for one Cloudinary account
pub struct CloudinaryClient {
    http_client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    api_base_url: String,
    delivery_base_url: String,
}

impl Debug for CloudinaryClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryClient")
            .field("cloud_name", &self.cloud_name)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Hex SHA-256 signature over sorted `k=v` pairs followed by the secret
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryClient {
    pub fn new(config: &CloudinaryConfig) -> Result<Self, MediaServiceError> {
        // No overall timeout: large videos may take minutes to transfer.
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            delivery_base_url: config.delivery_base_url.clone(),
        })
    }

    pub fn cloud_name(&self) -> &str {
        &self.cloud_name
    }

    /// Where renditions of this account's assets are served from
    pub fn delivery_target(&self) -> DeliveryTarget {
        DeliveryTarget::new(self.delivery_base_url.clone(), self.cloud_name.clone())
    }

    fn upload_url(&self, kind: MediaKind) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.api_base_url,
            self.cloud_name,
            kind.resource_type()
        )
    }

    /// Form fields for an upload: the signed parameters plus `api_key` and `signature`
    fn signed_fields(&self, request: &UploadRequest, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = vec![
            ("folder", request.folder.clone()),
            ("timestamp", timestamp.to_string()),
        ];
        if !request.eager.is_empty() {
            let eager = request
                .eager
                .iter()
                .map(|e| e.directive())
                .collect::<Vec<_>>()
                .join("|");
            params.push(("eager", eager));
        }
        if request.eager_async {
            params.push(("eager_async", "true".to_string()));
        }

        let signature = sign_params(&params, &self.api_secret);
        params.push(("api_key", self.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".to_string()));
        params
    }

    async fn file_part(source: UploadSource) -> Result<Part, MediaServiceError> {
        let part = match source {
            UploadSource::Bytes { data, file_name } => Part::bytes(data.to_vec()).file_name(file_name),
            UploadSource::File { path, file_name } => {
                let file = tokio::fs::File::open(&path).await?;
                let length = file.metadata().await?.len();
                let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
                Part::stream_with_length(body, length).file_name(file_name)
            }
        };
        Ok(part)
    }
}

#[async_trait]
impl MediaService for CloudinaryClient {
    #[tracing::instrument(
        skip(self, request),
        fields(
            media.kind = %request.kind,
            media.folder = %request.folder,
            media.file_name = %request.source.file_name()
        )
    )]
    async fn upload(&self, request: UploadRequest) -> Result<UploadedAsset, MediaServiceError> {
        let url = self.upload_url(request.kind);
        let timestamp = chrono::Utc::now().timestamp();

        let mut form = Form::new();
        for (name, value) in self.signed_fields(&request, timestamp) {
            form = form.text(name, value);
        }
        form = form.part("file", Self::file_part(request.source).await?);

        let response = self.http_client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<CloudinaryErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            tracing::warn!(status = %status, error = %message, "Media service rejected upload");
            return Err(MediaServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let asset: UploadedAsset = response
            .json()
            .await
            .map_err(|e| MediaServiceError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            public_id = %asset.public_id,
            bytes = asset.bytes,
            duration = ?asset.duration,
            "Media service upload completed"
        );

        Ok(asset)
    }
}
