//! YouTube Data API v3 client.
//!
//! Endpoints used: `channels` (handle/username lookup, uploads playlist),
//! `playlistItems` and `playlists`. The API key travels as the `key` query
//! parameter.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CatalogApi, CatalogError, Page, PlaylistInfo, MAX_PAGE_SIZE};
use crate::adapters::http_client;
use crate::domain::VideoRef;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube Data API client
pub struct YouTubeClient {
    /// API key (lookups fail with `MissingApiKey` when absent)
    api_key: Option<String>,
    /// API root, overridable for testing
    base_url: String,
    /// Items per page
    page_size: u32,
    /// HTTP client
    client: reqwest::Client,
}

/// Page of raw items; items are decoded one by one so a bad item is skipped
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
    #[serde(rename = "contentDetails")]
    content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemSnippet {
    title: Option<String>,
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistResource {
    id: String,
    snippet: PlaylistSnippet,
    content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistContentDetails {
    #[serde(default)]
    item_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl YouTubeClient {
    /// Create a new client
    pub fn new(
        api_key: Option<String>,
        page_size: u32,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            client: http_client(timeout)?,
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build an endpoint URL
    fn endpoint(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// GET an endpoint and decode the JSON body
    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let key = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;

        let response = self
            .client
            .get(self.endpoint(resource))
            .query(params)
            .query(&[("key", key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| CatalogError::MalformedResponse(format!("{}: {}", resource, e)))
    }

    /// Run a `channels` lookup and return the first matching id
    async fn lookup_channel(&self, filter: &str, value: &str) -> Result<Option<String>, CatalogError> {
        let response: ListResponse = self
            .get("channels", &[("part", "id"), (filter, value)])
            .await?;

        let Some(first) = response.items.into_iter().next() else {
            debug!(filter, value, "Channel lookup returned no items");
            return Ok(None);
        };

        let item: ChannelItem = serde_json::from_value(first)
            .map_err(|e| CatalogError::MalformedResponse(format!("channel item: {}", e)))?;
        Ok(Some(item.id))
    }

    fn page_size_param(&self) -> String {
        self.page_size.to_string()
    }
}

/// Decode the video references of one `playlistItems` page
fn parse_playlist_items(playlist_id: &str, items: Vec<serde_json::Value>) -> Vec<VideoRef> {
    items
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<PlaylistItem>(raw) {
            Ok(item) => Some(VideoRef::from_video_id(
                &item.snippet.resource_id.video_id,
                item.snippet.title,
            )),
            Err(e) => {
                warn!(playlist_id, "Skipping malformed playlist item: {}", e);
                None
            }
        })
        .collect()
}

/// Decode the playlists of one `playlists` page
fn parse_playlists(channel_id: &str, items: Vec<serde_json::Value>) -> Vec<PlaylistInfo> {
    items
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<PlaylistResource>(raw) {
            Ok(p) => Some(PlaylistInfo {
                id: p.id,
                title: p.snippet.title,
                description: p.snippet.description,
                video_count: p.content_details.map(|d| d.item_count).unwrap_or(0),
            }),
            Err(e) => {
                warn!(channel_id, "Skipping malformed playlist: {}", e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl CatalogApi for YouTubeClient {
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, CatalogError> {
        self.lookup_channel("forHandle", handle).await
    }

    async fn channel_id_for_username(
        &self,
        username: &str,
    ) -> Result<Option<String>, CatalogError> {
        self.lookup_channel("forUsername", username).await
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, CatalogError> {
        let response: ListResponse = self
            .get("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;

        let Some(first) = response.items.into_iter().next() else {
            return Ok(None);
        };

        let item: ChannelItem = serde_json::from_value(first)
            .map_err(|e| CatalogError::MalformedResponse(format!("channel item: {}", e)))?;

        item.content_details
            .and_then(|d| d.related_playlists.uploads)
            .map(Some)
            .ok_or_else(|| {
                CatalogError::MalformedResponse(format!(
                    "channel {} has no uploads playlist",
                    channel_id
                ))
            })
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<VideoRef>, CatalogError> {
        let page_size = self.page_size_param();
        let mut params = vec![
            ("part", "snippet"),
            ("maxResults", page_size.as_str()),
            ("playlistId", playlist_id),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: ListResponse = self.get("playlistItems", &params).await?;
        Ok(Page {
            items: parse_playlist_items(playlist_id, response.items),
            next_page_token: response.next_page_token,
        })
    }

    async fn channel_playlists_page(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistInfo>, CatalogError> {
        let page_size = self.page_size_param();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("channelId", channel_id),
            ("maxResults", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: ListResponse = self.get("playlists", &params).await?;
        Ok(Page {
            items: parse_playlists(channel_id, response.items),
            next_page_token: response.next_page_token,
        })
    }
}
