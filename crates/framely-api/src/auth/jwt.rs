//! Session token verification
//!
//! Tokens are either HS256 with a shared secret, or RS256/ES256 signed by keys published
//! at the identity provider's JWKS endpoint. JWKS keys are cached per `kid` and refetched
//! once the cache entry expires, which picks up key rotation.

use crate::auth::models::SessionClaims;
use anyhow::Context;
use chrono::{DateTime, Utc};
use framely_core::config::AuthConfig;
use framely_core::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const JWKS_CACHE_TTL_SECS: i64 = 3600;
const JWKS_FETCH_TIMEOUT_SECS: u64 = 10;

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>,
    #[serde(rename = "e")]
    pub exponent: Option<String>,
    #[serde(rename = "x")]
    pub x_coordinate: Option<String>,
    #[serde(rename = "y")]
    pub y_coordinate: Option<String>,
    #[serde(rename = "crv")]
    pub curve: Option<String>,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

struct JwksKeys {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: RwLock<HashMap<String, CachedKey>>,
}

enum KeySource {
    Secret(DecodingKey),
    Jwks(JwksKeys),
}

/// Verifies session tokens and yields their claims
#[derive(Clone)]
pub struct JwtVerifier {
    keys: Arc<KeySource>,
    issuer: Option<String>,
}

impl JwtVerifier {
    /// HS256 verification with a shared secret
    pub fn with_secret(secret: &str) -> Self {
        Self {
            keys: Arc::new(KeySource::Secret(DecodingKey::from_secret(
                secret.as_bytes(),
            ))),
            issuer: None,
        }
    }

    /// RS256/ES256 verification against keys published at `jwks_url`
    pub fn with_jwks(jwks_url: impl Into<String>) -> Result<Self, anyhow::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(JWKS_FETCH_TIMEOUT_SECS))
            .build()
            .context("Failed to build JWKS HTTP client")?;

        Ok(Self {
            keys: Arc::new(KeySource::Jwks(JwksKeys {
                jwks_url: jwks_url.into(),
                http_client,
                cache: RwLock::new(HashMap::new()),
            })),
            issuer: None,
        })
    }

    /// Require the `iss` claim to equal `issuer`
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// JWKS takes precedence when both a JWKS URL and a secret are configured
    pub fn from_config(config: &AuthConfig) -> Result<Self, anyhow::Error> {
        let verifier = match (&config.jwks_url, &config.jwt_secret) {
            (Some(url), _) => Self::with_jwks(url.clone())?,
            (None, Some(secret)) => Self::with_secret(secret),
            (None, None) => {
                return Err(anyhow::anyhow!(
                    "No session token verification configured (AUTH_JWKS_URL or AUTH_JWT_SECRET)"
                ))
            }
        };

        Ok(match &config.issuer {
            Some(issuer) => verifier.with_issuer(issuer.clone()),
            None => verifier,
        })
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    /// Validate and decode a session token
    pub async fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        let (key, algorithm) = match self.keys.as_ref() {
            KeySource::Secret(key) => {
                if header.alg != Algorithm::HS256 {
                    return Err(AppError::Unauthorized(format!(
                        "Unsupported algorithm: {:?}",
                        header.alg
                    )));
                }
                (key.clone(), Algorithm::HS256)
            }
            KeySource::Jwks(jwks) => {
                if !matches!(header.alg, Algorithm::RS256 | Algorithm::ES256) {
                    return Err(AppError::Unauthorized(format!(
                        "Unsupported algorithm: {:?}. Supported: RS256, ES256",
                        header.alg
                    )));
                }
                (
                    jwks.decoding_key(header.kid.as_deref()).await?,
                    header.alg,
                )
            }
        };

        let token_data =
            decode::<SessionClaims>(token, &key, &self.validation(algorithm)).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::Unauthorized("Token has expired".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                        AppError::Unauthorized("Invalid token issuer".to_string())
                    }
                    jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                        AppError::Unauthorized("Token is not yet valid (nbf)".to_string())
                    }
                    _ => AppError::Unauthorized(format!("Invalid or expired token: {}", e)),
                }
            })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized("Token has no subject".to_string()));
        }

        Ok(token_data.claims)
    }
}

impl JwksKeys {
    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse JWKS: {}", e)))
    }

    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        let cache_key = kid.unwrap_or("default").to_string();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.key.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let jwk = match kid {
            Some(kid) => jwks
                .keys
                .iter()
                .find(|k| k.key_id.as_deref() == Some(kid))
                .ok_or_else(|| {
                    AppError::Unauthorized(format!("Key ID {} not found in JWKS", kid))
                })?,
            None => jwks
                .keys
                .first()
                .ok_or_else(|| AppError::Unauthorized("No keys found in JWKS".to_string()))?,
        };

        let key = jwk_to_decoding_key(jwk)?;
        self.cache.write().await.insert(
            cache_key,
            CachedKey {
                key: key.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(JWKS_CACHE_TTL_SECS),
            },
        );

        Ok(key)
    }
}

fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
    match jwk.key_type.as_str() {
        "RSA" => {
            let n = jwk
                .modulus
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("RSA key missing modulus".to_string()))?;
            let e = jwk
                .exponent
                .as_ref()
                .ok_or_else(|| AppError::Unauthorized("RSA key missing exponent".to_string()))?;
            DecodingKey::from_rsa_components(n, e)
                .map_err(|e| AppError::Unauthorized(format!("Failed to create RSA key: {}", e)))
        }
        "EC" => {
            let x = jwk.x_coordinate.as_ref().ok_or_else(|| {
                AppError::Unauthorized("EC key missing x coordinate".to_string())
            })?;
            let y = jwk.y_coordinate.as_ref().ok_or_else(|| {
                AppError::Unauthorized("EC key missing y coordinate".to_string())
            })?;
            match jwk.curve.as_deref() {
                Some("P-256") => {}
                other => {
                    return Err(AppError::Unauthorized(format!(
                        "Unsupported EC curve: {:?} (only P-256 is supported)",
                        other
                    )))
                }
            }
            DecodingKey::from_ec_components(x, y)
                .map_err(|e| AppError::Unauthorized(format!("Failed to create EC key: {}", e)))
        }
        _ => Err(AppError::Unauthorized(format!(
            "Unsupported key type: {}",
            jwk.key_type
        ))),
    }
}
