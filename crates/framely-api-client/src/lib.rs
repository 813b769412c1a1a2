//! HTTP client for the Framely API.
//!
//! Provides a minimal client that authenticates as the signed-in user (Bearer token or
//! the `__session` cookie), generic GET/multipart helpers, domain methods (image upload,
//! video ingest, video listing) and the four page drivers built on the upload session.

pub mod api;
pub mod pages;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `Cookie: __session={token}`
    SessionCookie(String),
}

/// Non-success response from the API; `message` is the server's `error` field when present.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed with status {status}: {message}")]
pub struct ApiStatusError {
    pub status: StatusCode,
    pub message: String,
}

/// HTTP client for the Framely API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth) -> Result<Self> {
        Self::with_connect_timeout(base_url, auth, Duration::from_secs(CONNECT_TIMEOUT_SECS))
    }

    /// Only connecting is bounded: a video ingest answers once the whole file has
    /// reached the media service.
    pub fn with_connect_timeout(
        base_url: String,
        auth: Auth,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from environment: FRAMELY_API_URL and FRAMELY_TOKEN (a session token).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("FRAMELY_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let token = std::env::var("FRAMELY_TOKEN")
            .context("Missing session token. Set FRAMELY_TOKEN")?;

        Self::new(base_url, Auth::Bearer(token))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::SessionCookie(token) => request.header("Cookie", format!("__session={}", token)),
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;
        let response = error_for_status(response).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).multipart(form));

        let response = request.send().await.context("Failed to send request")?;
        let response = error_for_status(response).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }
}

/// Turn a non-success response into an [`ApiStatusError`]
pub(crate) async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = serde_json::from_str::<serde_json::Value>(&error_text)
        .ok()
        .and_then(|body| body.get("error")?.as_str().map(str::to_string))
        .unwrap_or(error_text);

    Err(ApiStatusError { status, message }.into())
}

/// Server-provided message carried by an API error, if the error came from a response
pub fn server_message(error: &anyhow::Error) -> Option<&str> {
    error
        .downcast_ref::<ApiStatusError>()
        .map(|e| e.message.as_str())
        .filter(|m| !m.is_empty())
}
