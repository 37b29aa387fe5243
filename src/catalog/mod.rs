//! Upstream video catalog (YouTube Data API).
//!
//! The pipeline only talks to the catalog through [`CatalogApi`], a narrow
//! set of single-request operations. Everything built on top of it is
//! independent of the HTTP client:
//!
//! - `resolver`: channel URL (four address forms) → channel id
//! - `paginator`: cursor-following enumeration of any paged listing
//! - `enumerator`: channel URL → every upload as a [`VideoRef`]
//!
//! ```text
//! channel URL → resolver → uploads playlist → paginator → Vec<VideoRef>
//! ```

pub mod enumerator;
pub mod paginator;
pub mod resolver;
pub mod youtube;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::VideoRef;

pub use enumerator::ChannelCatalog;
pub use paginator::paginate;
pub use resolver::{resolve_channel_id, ChannelRef};
pub use youtube::YouTubeClient;

/// Hard ceiling the listing endpoints accept per call
pub const MAX_PAGE_SIZE: u32 = 50;

/// Errors raised by catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Channel not found: {0}")]
    NotFound(String),

    #[error("Unsupported channel URL format: {0}")]
    UnsupportedUrl(String),

    #[error("YOUTUBE_API_KEY is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response format: {0}")]
    MalformedResponse(String),
}

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items extracted from this page
    pub items: Vec<T>,

    /// Cursor for the next page; `None` on the last page
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    /// A page followed by another one
    pub fn with_next(items: Vec<T>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: Some(token.into()),
        }
    }
}

/// Summary of a playlist owned by a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_count: u64,
}

/// Settings for catalog enumeration
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Items requested per page (clamped to [`MAX_PAGE_SIZE`])
    pub page_size: u32,

    /// Courtesy delay between successive page requests
    pub page_delay: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            page_delay: Duration::from_millis(100),
        }
    }
}

/// Single-request operations against the upstream catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Look up a channel id by `@handle`; `None` when nothing matches
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, CatalogError>;

    /// Look up a channel id by legacy username; `None` when nothing matches
    async fn channel_id_for_username(&self, username: &str)
        -> Result<Option<String>, CatalogError>;

    /// The "all uploads" playlist of a channel; `None` when the channel is unknown
    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, CatalogError>;

    /// One page of video references from a playlist
    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<VideoRef>, CatalogError>;

    /// One page of playlists owned by a channel
    async fn channel_playlists_page(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistInfo>, CatalogError>;
}
