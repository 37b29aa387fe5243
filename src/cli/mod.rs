//! Command-line interface for tubepost.
//!
//! Provides one command per pipeline stage (discover, sync, summarize,
//! publish) plus commands for inspecting and correcting the store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::adapters::{OpenAiSummarizer, SupadataClient, XClient};
use crate::catalog::{ChannelCatalog, PlaylistInfo, YouTubeClient};
use crate::config::ResolvedConfig;
use crate::core::Orchestrator;
use crate::domain::{VideoRef, VideoStatus};
use crate::store::Database;

/// tubepost - YouTube channel to X auto-posting pipeline
#[derive(Parser, Debug)]
#[command(name = "tubepost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register configured channels and fetch their videos
    Discover,

    /// Fetch new videos for every registered channel
    Sync,

    /// Transcribe and summarize the next pending video
    Summarize,

    /// Publish every summarized pending video
    Publish,

    /// Manage registered channels
    Channels {
        #[command(subcommand)]
        command: ChannelCommands,
    },

    /// List videos in the store
    Videos {
        /// Filter by status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,

        /// Maximum number of videos to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show video counts per status
    Status,

    /// Move a video in `error` back to `pending` so it is retried
    Reset {
        /// Video ID
        video_id: i64,
    },

    /// List the playlists of a channel
    Playlists {
        /// Channel URL (@handle, /channel/, /c/ or /user/ form)
        channel_url: String,
    },

    /// Write the video URLs of a channel or its playlists to a file
    Export {
        /// Channel URL (not needed with --playlist)
        #[arg(required_unless_present = "playlist")]
        channel_url: Option<String>,

        /// Export this playlist instead of the channel uploads
        #[arg(short, long, conflicts_with_all = ["channel_url", "all_playlists"])]
        playlist: Option<String>,

        /// Export the videos of every playlist the channel owns
        #[arg(long)]
        all_playlists: bool,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum ChannelCommands {
    /// Register a channel
    Add {
        /// Handle the channel's posts go out under
        handle: String,

        /// Channel URL
        url: String,
    },

    /// List registered channels
    List,
}

/// What `export` enumerates
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExportSource {
    /// The uploads of a channel
    Uploads(String),
    /// A single playlist by id
    Playlist(String),
    /// Every playlist of a channel
    AllPlaylists(String),
}

impl ExportSource {
    fn from_args(
        channel_url: Option<String>,
        playlist: Option<String>,
        all_playlists: bool,
    ) -> Result<Self> {
        match (channel_url, playlist) {
            (_, Some(playlist_id)) => Ok(Self::Playlist(playlist_id)),
            (Some(url), None) if all_playlists => Ok(Self::AllPlaylists(url)),
            (Some(url), None) => Ok(Self::Uploads(url)),
            (None, None) => anyhow::bail!("A channel URL or --playlist is required"),
        }
    }
}

/// Video status for CLI (maps to VideoStatus)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Published,
    Error,
}

impl From<StatusArg> for VideoStatus {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::Pending => VideoStatus::Pending,
            StatusArg::Published => VideoStatus::Published,
            StatusArg::Error => VideoStatus::Error,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self, config: ResolvedConfig) -> Result<()> {
        match self.command {
            Commands::Discover => {
                let orchestrator = build_orchestrator(&config)?;
                let report = orchestrator.run_discovery(&config.channels).await?;
                print_json(&report)
            }
            Commands::Sync => {
                let report = build_orchestrator(&config)?.run_sync().await?;
                print_json(&report)
            }
            Commands::Summarize => {
                let report = build_orchestrator(&config)?.run_summarization().await?;
                print_json(&report)
            }
            Commands::Publish => {
                let report = build_orchestrator(&config)?.run_publication().await?;
                print_json(&report)
            }
            Commands::Channels { command } => {
                execute_channels(&config, command)
            }
            Commands::Videos { status, limit } => {
                list_videos(&config, status.map(VideoStatus::from), limit)
            }
            Commands::Status => {
                show_status(&config)
            }
            Commands::Reset { video_id } => {
                reset_video(&config, video_id)
            }
            Commands::Playlists { channel_url } => {
                list_playlists(&config, &channel_url).await
            }
            Commands::Export {
                channel_url,
                playlist,
                all_playlists,
                output,
            } => {
                let source = ExportSource::from_args(channel_url, playlist, all_playlists)?;
                export_urls(&config, source, &output).await
            }
            Commands::Config => {
                show_config(&config)
            }
        }
    }
}

/// Open the configured database
fn open_store(config: &ResolvedConfig) -> Result<Database> {
    Database::open(&config.database)
        .with_context(|| format!("Failed to open database: {}", config.database.display()))
}

/// Build the catalog over the YouTube API
fn build_catalog(config: &ResolvedConfig) -> Result<ChannelCatalog> {
    let client = YouTubeClient::new(
        config.credentials.youtube_api_key.clone(),
        config.catalog.page_size,
        config.http_timeout,
    )
    .context("Failed to build YouTube client")?;
    Ok(ChannelCatalog::new(Arc::new(client), &config.catalog))
}

/// Wire the orchestrator with its real collaborators
fn build_orchestrator(config: &ResolvedConfig) -> Result<Orchestrator> {
    let store = open_store(config)?;
    let transcripts = SupadataClient::new(
        config.credentials.supadata_api_key.clone(),
        config.http_timeout,
    )?;
    let summarizer = OpenAiSummarizer::new(
        config.credentials.openai_api_key.clone(),
        config.summarizer.clone(),
        config.http_timeout,
    )?;
    let publisher = XClient::new(config.credentials.x_bearer_token.clone(), config.http_timeout)?;

    Ok(Orchestrator::new(
        store,
        build_catalog(config)?,
        Arc::new(transcripts),
        Arc::new(summarizer),
        Arc::new(publisher),
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute channel subcommands
fn execute_channels(config: &ResolvedConfig, command: ChannelCommands) -> Result<()> {
    let store = open_store(config)?;

    match command {
        ChannelCommands::Add { handle, url } => {
            let id = store.add_channel(&handle, &url)?;
            println!("Channel {} registered as {}", url, id);
        }
        ChannelCommands::List => {
            let channels = store.list_channels()?;
            if channels.is_empty() {
                println!("No channels registered");
                return Ok(());
            }

            println!("{:<6} {:<20} {}", "ID", "HANDLE", "URL");
            println!("{}", "-".repeat(70));
            for channel in channels {
                println!(
                    "{:<6} {:<20} {}",
                    channel.id, channel.external_handle, channel.channel_url
                );
            }
        }
    }

    Ok(())
}

/// List videos, most recent first
fn list_videos(config: &ResolvedConfig, status: Option<VideoStatus>, limit: usize) -> Result<()> {
    let store = open_store(config)?;
    let videos = store.list_videos(status, limit)?;

    if videos.is_empty() {
        println!("No videos found");
        return Ok(());
    }

    println!("{:<6} {:<10} {:<45} {}", "ID", "STATUS", "URL", "TITLE");
    println!("{}", "-".repeat(100));

    for video in videos {
        let title = video.title.as_deref().unwrap_or("-");
        let title: String = title.chars().take(40).collect();
        println!(
            "{:<6} {:<10} {:<45} {}",
            video.id, video.status, video.video_url, title
        );
    }

    Ok(())
}

/// Show per-status counts
fn show_status(config: &ResolvedConfig) -> Result<()> {
    let store = open_store(config)?;
    let counts = store.status_counts()?;

    println!("Pending:   {}", counts.pending);
    println!("Published: {}", counts.published);
    println!("Error:     {}", counts.error);
    println!("Total:     {}", counts.total());

    Ok(())
}

/// Operator reset of a failed video
fn reset_video(config: &ResolvedConfig, video_id: i64) -> Result<()> {
    let store = open_store(config)?;
    let video = store
        .get_video(video_id)?
        .with_context(|| format!("Video not found: {}", video_id))?;

    if video.status != VideoStatus::Error {
        anyhow::bail!(
            "Video {} is {}; only videos in error can be reset",
            video_id,
            video.status
        );
    }

    store.update_status(video_id, VideoStatus::Pending)?;
    println!("Video {} reset to pending", video_id);
    Ok(())
}

/// List the playlists of a channel
async fn list_playlists(config: &ResolvedConfig, channel_url: &str) -> Result<()> {
    let catalog = build_catalog(config)?;
    let playlists = catalog
        .channel_playlists(channel_url)
        .await
        .with_context(|| format!("Failed to list playlists for {}", channel_url))?;

    if playlists.is_empty() {
        println!("No playlists found");
        return Ok(());
    }

    println!("{:<36} {:<8} {}", "PLAYLIST ID", "VIDEOS", "TITLE");
    println!("{}", "-".repeat(80));
    for playlist in playlists {
        println!(
            "{:<36} {:<8} {}",
            playlist.id, playlist.video_count, playlist.title
        );
    }

    Ok(())
}

/// Write video URLs to a file, one per line
async fn export_urls(config: &ResolvedConfig, source: ExportSource, output: &Path) -> Result<()> {
    let catalog = build_catalog(config)?;
    let urls = match source {
        ExportSource::Uploads(channel_url) => {
            let refs = catalog.all_video_references(&channel_url).await;
            refs.into_iter().map(|r| r.url).collect()
        }
        ExportSource::Playlist(playlist_id) => {
            let refs = catalog.playlist_video_references(&playlist_id).await;
            refs.into_iter().map(|r| r.url).collect()
        }
        ExportSource::AllPlaylists(channel_url) => {
            let playlists = catalog
                .all_playlist_video_references(&channel_url)
                .await
                .with_context(|| format!("Failed to list playlists for {}", channel_url))?;
            for (playlist, refs) in &playlists {
                eprintln!("{:<8} {}", refs.len(), playlist.title);
            }
            playlist_union(&playlists)
        }
    };

    let mut content = urls.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    tokio::fs::write(output, content)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    eprintln!("Saved {} URLs to {}", urls.len(), output.display());
    Ok(())
}

/// Video URLs across playlists, first occurrence wins
fn playlist_union(playlists: &[(PlaylistInfo, Vec<VideoRef>)]) -> Vec<String> {
    let mut seen = HashSet::new();
    playlists
        .iter()
        .flat_map(|(_, refs)| refs.iter())
        .filter(|r| seen.insert(r.url.as_str()))
        .map(|r| r.url.clone())
        .collect()
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("Home:        {}", config.home.display());
    println!("Database:    {}", config.database.display());
    match &config.config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (none, using defaults)"),
    }
    println!("Page size:   {}", config.catalog.page_size);
    println!("Page delay:  {:?}", config.catalog.page_delay);
    println!("HTTP timeout: {:?}", config.http_timeout);
    println!("Model:       {}", config.summarizer.model);
    println!("Credentials: {:?}", config.credentials);

    println!("\nChannels:");
    if config.channels.is_empty() {
        println!("  (none)");
    }
    for channel in &config.channels {
        println!("  {:<20} {}", channel.handle, channel.url);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_videos_command() {
        let cli = Cli::try_parse_from(["tubepost", "videos", "--status", "error", "-l", "5"]).unwrap();
        match cli.command {
            Commands::Videos { status, limit } => {
                assert_eq!(status.map(VideoStatus::from), Some(VideoStatus::Error));
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_command() {
        let cli = Cli::try_parse_from([
            "tubepost",
            "export",
            "https://www.youtube.com/@CaseyZander",
            "--output",
            "videos.txt",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export { playlist: None, .. }
        ));
    }

    fn export_source(args: &[&str]) -> Result<ExportSource> {
        let mut argv = vec!["tubepost", "export"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["--output", "videos.txt"]);

        match Cli::try_parse_from(argv)?.command {
            Commands::Export {
                channel_url,
                playlist,
                all_playlists,
                ..
            } => ExportSource::from_args(channel_url, playlist, all_playlists),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_export_sources() {
        let channel = "https://www.youtube.com/@CaseyZander";

        assert_eq!(
            export_source(&[channel]).unwrap(),
            ExportSource::Uploads(channel.to_string())
        );
        assert_eq!(
            export_source(&[channel, "--all-playlists"]).unwrap(),
            ExportSource::AllPlaylists(channel.to_string())
        );
        // A playlist id needs no channel URL
        assert_eq!(
            export_source(&["--playlist", "PL123"]).unwrap(),
            ExportSource::Playlist("PL123".to_string())
        );
    }

    #[test]
    fn test_export_rejects_ambiguous_sources() {
        let channel = "https://www.youtube.com/@CaseyZander";

        assert!(export_source(&[]).is_err());
        assert!(export_source(&[channel, "--playlist", "PL123"]).is_err());
        assert!(export_source(&["--playlist", "PL123", "--all-playlists"]).is_err());
    }

    #[test]
    fn test_playlist_union_keeps_first_occurrence() {
        let playlist = |id: &str| PlaylistInfo {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            video_count: 0,
        };
        let refs = |ids: &[&str]| -> Vec<VideoRef> {
            ids.iter().map(|id| VideoRef::from_video_id(id, None)).collect()
        };

        let urls = playlist_union(&[
            (playlist("PL1"), refs(&["a", "b"])),
            (playlist("PL2"), refs(&["b", "c"])),
            (playlist("PL3"), Vec::new()),
        ]);

        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=a",
                "https://www.youtube.com/watch?v=b",
                "https://www.youtube.com/watch?v=c",
            ]
        );
    }

    #[test]
    fn test_reset_requires_id() {
        assert!(Cli::try_parse_from(["tubepost", "reset"]).is_err());
    }
}
