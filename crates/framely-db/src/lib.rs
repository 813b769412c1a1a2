//! Database repositories for data access layer
//!
//! Video Records are the only persistent state; they are written once per successful
//! ingest and read back by the dashboard listing.

pub mod videos;

pub use videos::{VideoRepository, VideoStore};
