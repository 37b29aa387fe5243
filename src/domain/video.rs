//! Video records and their lifecycle.
//!
//! A video moves one way through the pipeline:
//!
//! ```text
//!  [new]  --discover-->  pending
//!  pending --summarize--> pending (transcript + post text attached)
//!  pending --publish(ok)--> published
//!  pending --publish(fail)--> error
//! ```
//!
//! `error` rows leave the automatic pipeline. Only an explicit operator
//! reset moves them back to `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Base URL used for canonical video references
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Build the canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_PREFIX, video_id)
}

/// A video reference as enumerated from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    /// Canonical watch URL
    pub url: String,

    /// Title from the listing snippet, if the catalog returned one
    pub title: Option<String>,
}

impl VideoRef {
    /// Create a reference from a bare catalog video id
    pub fn from_video_id(video_id: &str, title: Option<String>) -> Self {
        Self {
            url: watch_url(video_id),
            title,
        }
    }
}

/// A persisted video row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub channel_id: i64,
    pub video_url: String,
    pub title: Option<String>,
    pub transcript: Option<String>,
    pub post_text: Option<String>,
    /// Media ids to attach when posting
    pub post_media: Option<String>,
    pub status: VideoStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// True while the video still waits for its transcript
    pub fn needs_transcript(&self) -> bool {
        self.status == VideoStatus::Pending && self.transcript.is_none()
    }

    /// True when the video has post text and has not been published yet
    pub fn is_ready_to_publish(&self) -> bool {
        self.status == VideoStatus::Pending
            && self
                .post_text
                .as_deref()
                .map(|t| !t.trim().is_empty())
                .unwrap_or(false)
    }
}

/// Lifecycle state of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Discovered; possibly summarized but not yet posted
    Pending,

    /// Posted successfully
    Published,

    /// Posting was attempted and failed
    Error,
}

impl VideoStatus {
    /// All statuses in display order
    pub const ALL: [VideoStatus; 3] = [Self::Pending, Self::Published, Self::Error];

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Published => "published",
            Self::Error => "error",
        }
    }

    /// Check whether moving to `next` is a legal transition
    ///
    /// `Error -> Pending` is the operator reset; no stage performs it.
    pub fn can_transition_to(&self, next: VideoStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Pending)
                | (Self::Pending, Self::Published)
                | (Self::Pending, Self::Error)
                | (Self::Error, Self::Pending)
        )
    }

    /// Check if no stage will pick this video up again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Default for VideoStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "published" => Ok(Self::Published),
            "error" => Ok(Self::Error),
            _ => anyhow::bail!("Unknown video status: {}", s),
        }
    }
}
