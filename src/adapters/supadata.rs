//! Supadata transcript API adapter.
//!
//! Endpoint: GET /v1/youtube/transcript?videoId=<id>
//! Auth: `x-api-key` header

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{error, info};

use super::{http_client, TranscriptSource};

const DEFAULT_BASE_URL: &str = "https://api.supadata.ai/v1";

/// Supadata transcript client
pub struct SupadataClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

/// Transcript response body
#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    #[serde(default)]
    content: Vec<TranscriptChunk>,
}

#[derive(Debug, Deserialize)]
struct TranscriptChunk {
    text: Option<String>,
}

/// Extract the `v=` video id from a watch URL
pub fn video_id_from_url(video_url: &str) -> Option<&str> {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    let re = VIDEO_ID.get_or_init(|| Regex::new(r"[?&]v=([\w-]+)").expect("valid regex"));
    re.captures(video_url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Join transcript chunks into one string
fn join_chunks(response: TranscriptResponse) -> String {
    response
        .content
        .into_iter()
        .filter_map(|c| c.text)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

impl SupadataClient {
    /// Create a new client
    pub fn new(api_key: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: http_client(timeout)?,
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Request the transcript for a video id
    async fn request(&self, api_key: &str, video_id: &str) -> Result<String> {
        let url = format!("{}/youtube/transcript", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("videoId", video_id)])
            .header("x-api-key", api_key)
            .send()
            .await
            .context("Failed to reach transcript API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcript API error ({}): {}", status, body);
        }

        let body: TranscriptResponse = response
            .json()
            .await
            .context("Failed to parse transcript response")?;

        Ok(join_chunks(body))
    }
}

#[async_trait]
impl TranscriptSource for SupadataClient {
    async fn fetch_transcript(&self, video_url: &str) -> Option<String> {
        info!(video_url, "Fetching transcript");

        let Some(api_key) = self.api_key.as_deref() else {
            error!("SUPADATA_API_KEY is not configured");
            return None;
        };

        let Some(video_id) = video_id_from_url(video_url) else {
            error!(video_url, "Could not extract video id from URL");
            return None;
        };

        match self.request(api_key, video_id).await {
            Ok(transcript) if transcript.is_empty() => {
                error!(video_id, "No transcript found in response");
                None
            }
            Ok(transcript) => Some(transcript),
            Err(e) => {
                error!(video_id, "Error fetching transcript: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_from_url() {
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            video_id_from_url("https://www.youtube.com/watch?feature=share&v=a-b_c"),
            Some("a-b_c")
        );
        assert_eq!(video_id_from_url("https://youtu.be/dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_join_chunks() {
        let response: TranscriptResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"text": "hello", "offset": 0},
                {"offset": 10},
                {"text": "world "}
            ],
            "lang": "en"
        }))
        .unwrap();
        assert_eq!(join_chunks(response), "hello world");
    }

    #[tokio::test]
    async fn test_missing_key_returns_none() {
        let client = SupadataClient::new(None, Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(client
            .fetch_transcript("https://www.youtube.com/watch?v=abc")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_unparseable_url_returns_none() {
        let client = SupadataClient::new(Some("KEY".into()), Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        assert!(client
            .fetch_transcript("https://www.youtube.com/@someone")
            .await
            .is_none());
    }
}
