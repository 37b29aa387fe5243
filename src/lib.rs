//! tubepost - YouTube channel to X auto-posting pipeline
//!
//! Watches a set of YouTube channels, stores every video it finds,
//! turns one video at a time into a short post via a transcript and an
//! LLM summary, and publishes the posts to X.
//!
//! # Architecture
//!
//! The pipeline is four independently triggered stages over one SQLite
//! store:
//! - discovery: register configured channels and fetch their videos
//! - sync: fetch videos that appeared since the last run
//! - summarization: transcript + post text for the next pending video
//! - publication: post every summarized video, marking it published or error
//!
//! # Modules
//!
//! - `catalog`: Channel resolution, pagination and enumeration (YouTube Data API)
//! - `adapters`: Transcript, summary and posting collaborators
//! - `core`: Synchronizer and Orchestrator
//! - `store`: SQLite persistence of channels and videos
//! - `domain`: Data structures (Channel, Video, VideoStatus)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Register configured channels and fetch their videos
//! tubepost discover
//!
//! # Summarize the next pending video, then post everything ready
//! tubepost summarize
//! tubepost publish
//! ```

pub mod adapters;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use catalog::{ChannelCatalog, ChannelRef, YouTubeClient};
pub use core::{Orchestrator, Synchronizer};
pub use domain::{Channel, Video, VideoRef, VideoStatus};
pub use store::Database;
