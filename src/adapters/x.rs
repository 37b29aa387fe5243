//! X (Twitter) API v2 adapter for publishing posts.
//!
//! Endpoint: POST /2/tweets
//! Auth: OAuth 2.0 user-context bearer token

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use super::{http_client, Publisher};

const DEFAULT_BASE_URL: &str = "https://api.x.com/2";

/// Why a post was not published
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Missing X API credentials")]
    MissingCredentials,

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unknown error posting: {0}")]
    Unknown(String),
}

impl PostError {
    /// Classify a non-success HTTP response
    fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Self::BadRequest(body),
            401 => Self::Unauthorized(body),
            403 => Self::Forbidden(body),
            429 => Self::RateLimited(body),
            _ => Self::Unknown(format!("HTTP {}: {}", status, body)),
        }
    }
}

/// Request body for creating a post
#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<MediaAttachment>,
}

#[derive(Debug, Serialize)]
struct MediaAttachment {
    media_ids: Vec<String>,
}

/// Response from the create endpoint
#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: Option<CreatedPost>,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

/// Split a comma-separated media id list
fn media_ids(media: Option<&str>) -> Option<MediaAttachment> {
    let ids: Vec<String> = media?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(MediaAttachment { media_ids: ids })
    }
}

/// X API client
pub struct XClient {
    bearer_token: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl XClient {
    /// Create a new client
    pub fn new(bearer_token: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http_client(timeout)?,
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a post, returning its id
    pub async fn create_post(&self, text: &str, media: Option<&str>) -> Result<String, PostError> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or(PostError::MissingCredentials)?;

        let request = CreatePostRequest {
            text,
            media: media_ids(media),
        };

        let response = self
            .client
            .post(format!("{}/tweets", self.base_url))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| PostError::Unknown(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostError::from_status(status.as_u16(), body));
        }

        let body: CreatePostResponse = response
            .json()
            .await
            .map_err(|e| PostError::Unknown(e.to_string()))?;

        body.data
            .map(|d| d.id)
            .ok_or_else(|| PostError::Unknown("no post id in response".to_string()))
    }
}

#[async_trait]
impl Publisher for XClient {
    async fn publish(&self, text: &str, media: Option<&str>) -> bool {
        let preview: String = text.chars().take(50).collect();
        info!("Posting: {}...", preview);

        match self.create_post(text, media).await {
            Ok(id) => {
                info!(post_id = %id, "Successfully posted");
                true
            }
            Err(e) => {
                error!("Failed to post: {}", e);
                false
            }
        }
    }
}
