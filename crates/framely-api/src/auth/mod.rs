//! Caller identity
//!
//! Session tokens issued by the identity provider are verified by `auth_middleware`,
//! which places a `RequestIdentity` in the request extensions for handlers to extract.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtVerifier;
pub use middleware::{auth_middleware, AuthState};
pub use models::{RequestIdentity, SessionClaims, SessionResponse};
