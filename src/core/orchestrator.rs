//! Pipeline orchestrator.
//!
//! Four independently triggered stages, each one bounded unit of work:
//!
//! - discovery: register configured channels and sync them
//! - sync: sync every persisted channel
//! - summarization: transcript + post text for exactly one video
//! - publication: post every summarized pending video
//!
//! Failures are isolated per channel and per video; a stage only returns
//! an error when it cannot read its own work list from the store.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{Publisher, Summarizer, TranscriptSource};
use crate::catalog::ChannelCatalog;
use crate::config::ChannelConfig;
use crate::domain::{Channel, VideoStatus};
use crate::store::Database;

use super::sync::Synchronizer;

/// Result of a discovery run
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub run_id: Uuid,
    pub channels_processed: usize,
    pub videos_added: usize,
    pub failed_channels: usize,
}

/// Result of a sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub channels_processed: usize,
    pub new_videos: usize,
    pub failed_channels: usize,
}

/// Result of a summarization run
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub run_id: Uuid,
    /// 1 when a transcript and post text were stored, otherwise 0
    pub processed: usize,
    /// The video that was selected, if any was eligible
    pub video_id: Option<i64>,
}

/// Result of a publication run
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub run_id: Uuid,
    pub attempted: usize,
    pub posted: usize,
    pub failed: usize,
    /// Publish outcomes that could not be written back to the store
    pub status_write_failures: usize,
}

/// Main pipeline orchestrator
pub struct Orchestrator {
    store: Database,
    synchronizer: Synchronizer,
    transcripts: Arc<dyn TranscriptSource>,
    summarizer: Arc<dyn Summarizer>,
    publisher: Arc<dyn Publisher>,
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators
    pub fn new(
        store: Database,
        catalog: ChannelCatalog,
        transcripts: Arc<dyn TranscriptSource>,
        summarizer: Arc<dyn Summarizer>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            synchronizer: Synchronizer::new(store.clone(), catalog),
            store,
            transcripts,
            summarizer,
            publisher,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Database {
        &self.store
    }

    /// Register the configured channels and sync each of them
    #[instrument(skip_all, fields(channels = channels.len()))]
    pub async fn run_discovery(&self, channels: &[ChannelConfig]) -> Result<DiscoveryReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting discovery");

        let mut report = DiscoveryReport {
            run_id,
            channels_processed: 0,
            videos_added: 0,
            failed_channels: 0,
        };

        for entry in channels {
            report.channels_processed += 1;

            let channel = match self.register(entry) {
                Ok(channel) => channel,
                Err(e) => {
                    error!(handle = %entry.handle, "Error registering channel: {:#}", e);
                    report.failed_channels += 1;
                    continue;
                }
            };

            match self.synchronizer.sync(&channel).await {
                Ok(added) => report.videos_added += added,
                Err(e) => {
                    error!(handle = %entry.handle, "Error processing channel: {:#}", e);
                    report.failed_channels += 1;
                }
            }
        }

        info!(
            %run_id,
            channels = report.channels_processed,
            added = report.videos_added,
            failed = report.failed_channels,
            "Discovery finished"
        );
        Ok(report)
    }

    fn register(&self, entry: &ChannelConfig) -> Result<Channel> {
        let id = self.store.add_channel(&entry.handle, &entry.url)?;
        Ok(Channel {
            id,
            external_handle: entry.handle.clone(),
            channel_url: entry.url.clone(),
        })
    }

    /// Sync every persisted channel
    #[instrument(skip_all)]
    pub async fn run_sync(&self) -> Result<SyncReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting sync");

        let channels = self
            .store
            .list_channels()
            .context("Failed to list channels")?;

        let mut report = SyncReport {
            run_id,
            channels_processed: 0,
            new_videos: 0,
            failed_channels: 0,
        };

        for channel in &channels {
            report.channels_processed += 1;
            match self.synchronizer.sync(channel).await {
                Ok(added) => report.new_videos += added,
                Err(e) => {
                    error!(channel = %channel.channel_url, "Error syncing channel: {:#}", e);
                    report.failed_channels += 1;
                }
            }
        }

        info!(
            %run_id,
            channels = report.channels_processed,
            new_videos = report.new_videos,
            "Sync finished"
        );
        Ok(report)
    }

    /// Transcribe and summarize the lowest-id pending video lacking a transcript
    ///
    /// At most one transcript/summary round-trip per call. A missing
    /// transcript or summary leaves the video untouched for the next call.
    #[instrument(skip_all)]
    pub async fn run_summarization(&self) -> Result<SummaryReport> {
        let run_id = Uuid::new_v4();
        let mut report = SummaryReport {
            run_id,
            processed: 0,
            video_id: None,
        };

        let Some(video) = self
            .store
            .next_untranscribed_pending()
            .context("Failed to select pending video")?
        else {
            info!(%run_id, "No pending videos without a transcript");
            return Ok(report);
        };

        report.video_id = Some(video.id);
        info!(%run_id, video_id = video.id, url = %video.video_url, "Summarizing video");

        let Some(transcript) = self.transcripts.fetch_transcript(&video.video_url).await else {
            warn!(video_id = video.id, "Transcript unavailable, will retry next run");
            return Ok(report);
        };

        let Some(post_text) = self.summarizer.summarize(&transcript).await else {
            warn!(video_id = video.id, "Summary unavailable, will retry next run");
            return Ok(report);
        };

        self.store
            .update_transcript_and_text(video.id, &transcript, &post_text)
            .with_context(|| format!("Failed to store summary for video {}", video.id))?;

        report.processed = 1;
        info!(%run_id, video_id = video.id, "Stored transcript and post text");
        Ok(report)
    }

    /// Publish every pending video that has post text
    #[instrument(skip_all)]
    pub async fn run_publication(&self) -> Result<PublishReport> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting publication");

        let videos = self
            .store
            .list_publishable()
            .context("Failed to list publishable videos")?;

        let mut report = PublishReport {
            run_id,
            attempted: 0,
            posted: 0,
            failed: 0,
            status_write_failures: 0,
        };

        for video in videos {
            let Some(text) = video.post_text.as_deref() else {
                continue;
            };
            report.attempted += 1;

            let published = self.publisher.publish(text, video.post_media.as_deref()).await;
            let status = if published {
                VideoStatus::Published
            } else {
                VideoStatus::Error
            };

            // Only outcomes written to the store are counted
            if let Err(e) = self.store.update_status(video.id, status) {
                error!(video_id = video.id, %status, "Failed to record status: {}", e);
                report.status_write_failures += 1;
            } else if published {
                report.posted += 1;
            } else {
                report.failed += 1;
            }
        }

        info!(
            %run_id,
            attempted = report.attempted,
            posted = report.posted,
            failed = report.failed,
            status_write_failures = report.status_write_failures,
            "Publication finished"
        );
        Ok(report)
    }
}
