//! Framely API Library
//!
//! HTTP handlers, middleware and application setup for the upload proxy and video
//! ingest server.

mod api_doc;
mod handlers;
mod middleware;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, DbState, MediaState};
