//! Shared fakes for integration tests.
//!
//! `FakeCatalog` stands in for the YouTube Data API. Each playlist is a
//! list of pages; page `n` is served for cursor `page-n` and links to
//! `page-(n+1)` while more pages remain.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tubepost::catalog::{CatalogApi, CatalogError, CatalogSettings, Page, PlaylistInfo};
use tubepost::domain::{watch_url, VideoRef};
use tubepost::ChannelCatalog;

#[derive(Default)]
pub struct FakeCatalog {
    handles: Mutex<HashMap<String, String>>,
    usernames: Mutex<HashMap<String, String>>,
    uploads: Mutex<HashMap<String, String>>,
    pages: Mutex<HashMap<String, Vec<Vec<String>>>>,
    failing_handles: Mutex<HashSet<String>>,
    /// Page index at which a playlist listing starts failing
    fail_at: Mutex<HashMap<String, usize>>,
    /// Every cursor passed to `playlist_items_page`, in call order
    cursors: Mutex<Vec<Option<String>>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `@handle` as `channel_id` with an uploads playlist split into pages
    pub fn with_channel(self, handle: &str, channel_id: &str, pages: &[&[&str]]) -> Self {
        self.handles
            .lock()
            .unwrap()
            .insert(handle.to_string(), channel_id.to_string());
        let playlist = uploads_for(channel_id);
        self.uploads
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), playlist.clone());
        self.set_pages(&playlist, pages);
        self
    }

    pub fn with_username(self, username: &str, channel_id: &str) -> Self {
        self.usernames
            .lock()
            .unwrap()
            .insert(username.to_string(), channel_id.to_string());
        self
    }

    /// Make the handle lookup fail with an API error
    pub fn with_failing_handle(self, handle: &str) -> Self {
        self.failing_handles.lock().unwrap().insert(handle.to_string());
        self
    }

    /// Fail the listing of `playlist` when page `index` is requested
    pub fn fail_listing_at(&self, playlist: &str, index: usize) {
        self.fail_at
            .lock()
            .unwrap()
            .insert(playlist.to_string(), index);
    }

    /// Replace the contents of a playlist
    pub fn set_pages(&self, playlist: &str, pages: &[&[&str]]) {
        let pages = pages
            .iter()
            .map(|page| page.iter().map(|id| id.to_string()).collect())
            .collect();
        self.pages
            .lock()
            .unwrap()
            .insert(playlist.to_string(), pages);
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }
}

pub fn uploads_for(channel_id: &str) -> String {
    format!("UU-{}", channel_id)
}

/// Catalog over the fake with no delay between pages
pub fn catalog(api: Arc<FakeCatalog>) -> ChannelCatalog {
    let settings = CatalogSettings {
        page_size: 50,
        page_delay: Duration::ZERO,
    };
    ChannelCatalog::new(api, &settings)
}

pub fn url(video_id: &str) -> String {
    watch_url(video_id)
}

fn page_index(cursor: Option<&str>) -> Result<usize, CatalogError> {
    match cursor {
        None => Ok(0),
        Some(token) => token
            .strip_prefix("page-")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| CatalogError::MalformedResponse(format!("bad cursor {}", token))),
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, CatalogError> {
        if self.failing_handles.lock().unwrap().contains(handle) {
            return Err(CatalogError::Api {
                status: 500,
                message: "backend error".to_string(),
            });
        }
        Ok(self.handles.lock().unwrap().get(handle).cloned())
    }

    async fn channel_id_for_username(
        &self,
        username: &str,
    ) -> Result<Option<String>, CatalogError> {
        Ok(self.usernames.lock().unwrap().get(username).cloned())
    }

    async fn uploads_playlist_id(&self, channel_id: &str) -> Result<Option<String>, CatalogError> {
        Ok(self.uploads.lock().unwrap().get(channel_id).cloned())
    }

    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<VideoRef>, CatalogError> {
        self.cursors
            .lock()
            .unwrap()
            .push(page_token.map(String::from));

        let index = page_index(page_token)?;
        if self.fail_at.lock().unwrap().get(playlist_id) == Some(&index) {
            return Err(CatalogError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }

        let pages = self.pages.lock().unwrap();
        let Some(pages) = pages.get(playlist_id) else {
            return Err(CatalogError::NotFound(playlist_id.to_string()));
        };

        let items = pages
            .get(index)
            .map(|ids| {
                ids.iter()
                    .map(|id| VideoRef::from_video_id(id, Some(format!("Video {}", id))))
                    .collect()
            })
            .unwrap_or_default();

        if index + 1 < pages.len() {
            Ok(Page::with_next(items, format!("page-{}", index + 1)))
        } else {
            Ok(Page::last(items))
        }
    }

    async fn channel_playlists_page(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<PlaylistInfo>, CatalogError> {
        let uploads = uploads_for(channel_id);
        let info = |id: &str, count: u64| PlaylistInfo {
            id: id.to_string(),
            title: format!("Playlist {}", id),
            description: String::new(),
            video_count: count,
        };

        match page_token {
            None => Ok(Page::with_next(vec![info(&uploads, 3)], "page-1")),
            _ => Ok(Page::last(vec![info("PL-extra", 1)])),
        }
    }
}
