//! Channel-level enumeration built on the resolver and paginator.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::paginator::paginate;
use super::resolver::resolve_channel_id;
use super::{CatalogApi, CatalogError, CatalogSettings, PlaylistInfo};
use crate::domain::VideoRef;

/// Enumerates channel contents through a [`CatalogApi`]
#[derive(Clone)]
pub struct ChannelCatalog {
    api: Arc<dyn CatalogApi>,
    page_delay: Duration,
}

impl ChannelCatalog {
    /// Create a catalog over the given API
    pub fn new(api: Arc<dyn CatalogApi>, settings: &CatalogSettings) -> Self {
        Self {
            api,
            page_delay: settings.page_delay,
        }
    }

    /// Resolve a channel URL to its channel id
    pub async fn resolve(&self, channel_url: &str) -> Result<String, CatalogError> {
        resolve_channel_id(self.api.as_ref(), channel_url).await
    }

    /// Every video reference in a playlist, in listing order
    pub async fn playlist_video_references(&self, playlist_id: &str) -> Vec<VideoRef> {
        let api = Arc::clone(&self.api);
        let playlist = playlist_id.to_string();

        paginate(playlist_id, self.page_delay, move |cursor: Option<String>| {
            let api = Arc::clone(&api);
            let playlist = playlist.clone();
            async move { api.playlist_items_page(&playlist, cursor.as_deref()).await }
        })
        .await
    }

    /// Every upload of a channel
    ///
    /// Any failing step yields an empty list. An empty result therefore
    /// means "nothing found this cycle", not "the channel has no videos".
    #[instrument(skip(self))]
    pub async fn all_video_references(&self, channel_url: &str) -> Vec<VideoRef> {
        match self.uploads_playlist(channel_url).await {
            Ok(uploads) => {
                let refs = self.playlist_video_references(&uploads).await;
                info!(playlist = %uploads, videos = refs.len(), "Enumerated channel uploads");
                refs
            }
            Err(e) => {
                warn!("Could not enumerate channel: {}", e);
                Vec::new()
            }
        }
    }

    /// Resolve the channel and find its "all uploads" playlist
    async fn uploads_playlist(&self, channel_url: &str) -> Result<String, CatalogError> {
        let channel_id = self.resolve(channel_url).await?;
        self.api
            .uploads_playlist_id(&channel_id)
            .await?
            .ok_or(CatalogError::NotFound(channel_id))
    }

    /// Every playlist a channel owns
    pub async fn channel_playlists(
        &self,
        channel_url: &str,
    ) -> Result<Vec<PlaylistInfo>, CatalogError> {
        let channel_id = self.resolve(channel_url).await?;
        let api = Arc::clone(&self.api);
        let label = format!("playlists:{}", channel_id);

        let playlists = paginate(&label, self.page_delay, move |cursor: Option<String>| {
            let api = Arc::clone(&api);
            let channel_id = channel_id.clone();
            async move { api.channel_playlists_page(&channel_id, cursor.as_deref()).await }
        })
        .await;

        Ok(playlists)
    }

    /// Every playlist of a channel together with its video references
    ///
    /// Playlists come back in listing order. A playlist whose items cannot
    /// be listed is kept with whatever the paginator gathered, possibly none.
    #[instrument(skip(self))]
    pub async fn all_playlist_video_references(
        &self,
        channel_url: &str,
    ) -> Result<Vec<(PlaylistInfo, Vec<VideoRef>)>, CatalogError> {
        let playlists = self.channel_playlists(channel_url).await?;
        info!(playlists = playlists.len(), "Enumerating channel playlists");

        let mut collected = Vec::with_capacity(playlists.len());
        for (index, playlist) in playlists.into_iter().enumerate() {
            if index > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let refs = self.playlist_video_references(&playlist.id).await;
            info!(playlist = %playlist.title, videos = refs.len(), "Enumerated playlist");
            collected.push((playlist, refs));
        }

        Ok(collected)
    }
}
