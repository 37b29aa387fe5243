//! Domain types for the tubepost pipeline.
//!
//! This module contains the core data structures:
//! - Channel: A content source registered for syncing
//! - Video: A discovered upload and its lifecycle state
//! - VideoRef: A video reference as enumerated from the catalog

pub mod channel;
pub mod video;

// Re-export commonly used types
pub use channel::Channel;
pub use video::{watch_url, Video, VideoRef, VideoStatus};
