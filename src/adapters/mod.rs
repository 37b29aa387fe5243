//! Adapter interfaces for external services.
//!
//! Each collaborator collapses its failures at the boundary: transcripts
//! and summaries come back as `Option`, posting as `bool`. Failure detail
//! is logged here and never reaches the orchestrator.

pub mod openai;
pub mod supadata;
pub mod x;

use std::time::Duration;

use async_trait::async_trait;

// Re-export the concrete adapters
pub use openai::{clean_response, truncate_post, OpenAiSummarizer, SummarizerSettings};
pub use supadata::SupadataClient;
pub use x::{PostError, XClient};

/// Source of video transcripts
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for a video URL
    ///
    /// `None` on missing credentials, an unparseable URL or any upstream
    /// error. Never fails loudly.
    async fn fetch_transcript(&self, video_url: &str) -> Option<String>;
}

/// Turns a transcript into short social post text
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a transcript; `None` when no usable text was produced
    async fn summarize(&self, transcript: &str) -> Option<String>;
}

/// Publishes post text to the social network
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a post, optionally with already-uploaded media ids
    async fn publish(&self, text: &str, media: Option<&str>) -> bool;
}

/// Build an HTTP client with a request timeout
pub(crate) fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}
