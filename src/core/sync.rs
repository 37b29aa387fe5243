//! Catalog synchronization.
//!
//! Diffs a channel's live upload list against the URLs already recorded
//! and inserts only the unseen ones. Membership is decided purely by URL
//! equality, so running a sync twice with no upstream change inserts
//! nothing the second time.

use std::collections::HashSet;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::catalog::ChannelCatalog;
use crate::domain::{Channel, VideoRef};
use crate::store::Database;

/// Live references that are not yet persisted, in live-list order
///
/// Duplicates inside the live list are collapsed to their first occurrence.
pub fn new_references(live: Vec<VideoRef>, persisted: &HashSet<String>) -> Vec<VideoRef> {
    let mut seen = HashSet::new();
    live.into_iter()
        .filter(|r| !persisted.contains(&r.url) && seen.insert(r.url.clone()))
        .collect()
}

/// Synchronizes channels from the catalog into the store
#[derive(Clone)]
pub struct Synchronizer {
    store: Database,
    catalog: ChannelCatalog,
}

impl Synchronizer {
    /// Create a synchronizer
    pub fn new(store: Database, catalog: ChannelCatalog) -> Self {
        Self { store, catalog }
    }

    /// Insert the channel's unseen videos, returning how many were added
    #[instrument(skip(self, channel), fields(channel = %channel.channel_url))]
    pub async fn sync(&self, channel: &Channel) -> Result<usize> {
        let live = self.catalog.all_video_references(&channel.channel_url).await;
        let persisted = self
            .store
            .list_video_urls(channel.id)
            .with_context(|| format!("Failed to load video URLs for channel {}", channel.id))?;

        let fresh = new_references(live, &persisted);
        let mut inserted = 0usize;

        for video in &fresh {
            let added = self
                .store
                .add_video(channel.id, &video.url, video.title.as_deref())
                .with_context(|| format!("Failed to insert video {}", video.url))?;

            if added {
                inserted += 1;
            } else {
                // Already recorded under another channel
                debug!(url = %video.url, "Video already known, skipped");
            }
        }

        info!(inserted, known = persisted.len(), "Channel synchronized");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(id: &str) -> VideoRef {
        VideoRef::from_video_id(id, None)
    }

    #[test]
    fn test_new_references_preserves_live_order() {
        let persisted: HashSet<String> = [r("v2").url].into_iter().collect();
        let fresh = new_references(vec![r("v1"), r("v2"), r("v3")], &persisted);
        assert_eq!(fresh, vec![r("v1"), r("v3")]);
    }

    #[test]
    fn test_new_references_collapses_live_duplicates() {
        let fresh = new_references(vec![r("v1"), r("v1"), r("v2")], &HashSet::new());
        assert_eq!(fresh, vec![r("v1"), r("v2")]);
    }

    #[test]
    fn test_new_references_all_known() {
        let persisted: HashSet<String> = [r("v1").url, r("v2").url].into_iter().collect();
        assert!(new_references(vec![r("v2"), r("v1")], &persisted).is_empty());
    }
}
