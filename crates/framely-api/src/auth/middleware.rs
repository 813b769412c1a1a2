use crate::auth::jwt::JwtVerifier;
use crate::auth::models::RequestIdentity;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use framely_core::AppError;
use std::sync::Arc;

/// Cookie the identity provider's frontend SDK stores the session token in
pub const SESSION_COOKIE: &str = "__session";

#[derive(Clone)]
pub struct AuthState {
    pub verifier: JwtVerifier,
}

impl AuthState {
    pub fn new(verifier: JwtVerifier) -> Self {
        Self { verifier }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|v| !v.is_empty())
}

fn unauthorized() -> Response {
    HttpAppError(AppError::Unauthorized("Unauthorized".to_string())).into_response()
}

/// Verify the session token (bearer header first, then the session cookie)
/// and attach the caller's `RequestIdentity`
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()).or_else(|| session_cookie(request.headers()))
    {
        Some(token) => token,
        None => {
            tracing::debug!(path = %request.uri().path(), "Missing session token");
            return unauthorized();
        }
    };

    match auth_state.verifier.verify(&token).await {
        Ok(claims) => {
            let identity = RequestIdentity::from(claims);
            tracing::debug!(user_id = %identity.user_id, "Authenticated request");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Session token rejected");
            unauthorized()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; __session=tok.en.value; other=1"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("tok.en.value"));

        headers.insert(header::COOKIE, HeaderValue::from_static("__session_other=x"));
        assert_eq!(session_cookie(&headers), None);
    }
}
