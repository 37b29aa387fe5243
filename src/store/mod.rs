//! SQLite-backed store for channels and videos.
//!
//! The store is the single writer of record. Every operation is one short,
//! auto-committing call on a shared connection; mutation is always keyed by
//! video id, never bulk-replaced.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Channel, Video, VideoStatus};

/// Errors that can occur in the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database connection lock poisoned")]
    LockPoisoned,

    #[error("Video not found: {0}")]
    VideoNotFound(i64),

    #[error("Video {0} already has a transcript")]
    AlreadyTranscribed(i64),

    #[error("Invalid status transition for video {id}: {from} → {to}")]
    InvalidTransition {
        id: i64,
        from: VideoStatus,
        to: VideoStatus,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS channels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_handle TEXT NOT NULL UNIQUE,
    channel_url TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS videos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id INTEGER NOT NULL REFERENCES channels(id),
    video_url TEXT NOT NULL UNIQUE,
    title TEXT,
    transcript TEXT,
    post_text TEXT,
    post_media TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'published', 'error')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_status ON videos(status, id);
CREATE INDEX IF NOT EXISTS idx_videos_channel ON videos(channel_id);
"#;

const VIDEO_COLUMNS: &str = "id, channel_id, video_url, title, transcript, post_text, \
     post_media, status, created_at, updated_at";

impl ToSql for VideoStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for VideoStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: anyhow::Error| FromSqlError::Other(e.into()))
    }
}

/// Per-status video totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub published: usize,
    pub error: usize,
}

impl StatusCounts {
    /// Total videos across all statuses
    pub fn total(&self) -> usize {
        self.pending + self.published + self.error
    }
}

/// Persisted store for channels and videos
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and apply the schema
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            ",
        )?;

        Self::from_connection(conn)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Register a channel, returning its id
    ///
    /// Idempotent: an existing row with the same URL is returned unchanged.
    pub fn add_channel(&self, handle: &str, channel_url: &str) -> StoreResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO channels (external_handle, channel_url) VALUES (?1, ?2)",
            params![handle, channel_url],
        )?;
        let id = conn.query_row(
            "SELECT id FROM channels WHERE channel_url = ?1",
            params![channel_url],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// All registered channels, oldest first
    pub fn list_channels(&self) -> StoreResult<Vec<Channel>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, external_handle, channel_url FROM channels ORDER BY id")?;
        let channels = stmt
            .query_map([], map_channel)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(channels)
    }

    /// Look up a channel by its registered URL
    pub fn find_channel_by_url(&self, channel_url: &str) -> StoreResult<Option<Channel>> {
        let conn = self.conn()?;
        let channel = conn
            .query_row(
                "SELECT id, external_handle, channel_url FROM channels WHERE channel_url = ?1",
                params![channel_url],
                map_channel,
            )
            .optional()?;
        Ok(channel)
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Insert a new pending video
    ///
    /// Returns `false` when a row with the same URL already exists; the
    /// existing row is left untouched.
    pub fn add_video(
        &self,
        channel_id: i64,
        video_url: &str,
        title: Option<&str>,
    ) -> StoreResult<bool> {
        let now = Utc::now();
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO videos (channel_id, video_url, title, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![channel_id, video_url, title, VideoStatus::Pending, now],
        )?;
        Ok(inserted == 1)
    }

    /// Get a video by id
    pub fn get_video(&self, video_id: i64) -> StoreResult<Option<Video>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM videos WHERE id = ?1", VIDEO_COLUMNS);
        let video = conn
            .query_row(&sql, params![video_id], map_video)
            .optional()?;
        Ok(video)
    }

    /// Look up a video by URL
    pub fn find_video_by_url(&self, video_url: &str) -> StoreResult<Option<Video>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM videos WHERE video_url = ?1", VIDEO_COLUMNS);
        let video = conn
            .query_row(&sql, params![video_url], map_video)
            .optional()?;
        Ok(video)
    }

    /// All videos with the given status, ordered by id
    pub fn list_videos_by_status(&self, status: VideoStatus) -> StoreResult<Vec<Video>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM videos WHERE status = ?1 ORDER BY id ASC",
            VIDEO_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let videos = stmt
            .query_map(params![status], map_video)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    /// Most recent videos, optionally filtered by status
    pub fn list_videos(&self, status: Option<VideoStatus>, limit: usize) -> StoreResult<Vec<Video>> {
        let conn = self.conn()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let videos = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM videos WHERE status = ?1 ORDER BY id DESC LIMIT ?2",
                    VIDEO_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![status, limit], map_video)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!("SELECT {} FROM videos ORDER BY id DESC LIMIT ?1", VIDEO_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit], map_video)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(videos)
    }

    /// The lowest-id pending video that has no transcript yet
    pub fn next_untranscribed_pending(&self) -> StoreResult<Option<Video>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM videos WHERE status = ?1 AND transcript IS NULL ORDER BY id ASC LIMIT 1",
            VIDEO_COLUMNS
        );
        let video = conn
            .query_row(&sql, params![VideoStatus::Pending], map_video)
            .optional()?;
        Ok(video)
    }

    /// Pending videos that already carry post text, ordered by id
    pub fn list_publishable(&self) -> StoreResult<Vec<Video>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM videos
             WHERE status = ?1 AND post_text IS NOT NULL AND TRIM(post_text) <> ''
             ORDER BY id ASC",
            VIDEO_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let videos = stmt
            .query_map(params![VideoStatus::Pending], map_video)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(videos)
    }

    /// URLs already recorded for a channel
    pub fn list_video_urls(&self, channel_id: i64) -> StoreResult<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT video_url FROM videos WHERE channel_id = ?1")?;
        let urls = stmt
            .query_map(params![channel_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(urls)
    }

    /// Attach the transcript and generated post text; status is unchanged
    ///
    /// A transcript is written once. Videos that already carry one are
    /// rejected with `AlreadyTranscribed` and left as they are.
    pub fn update_transcript_and_text(
        &self,
        video_id: i64,
        transcript: &str,
        post_text: &str,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE videos SET transcript = ?1, post_text = ?2, updated_at = ?3
             WHERE id = ?4 AND transcript IS NULL",
            params![transcript, post_text, Utc::now(), video_id],
        )?;
        if updated == 1 {
            return Ok(());
        }

        let exists = conn
            .query_row("SELECT 1 FROM videos WHERE id = ?1", params![video_id], |_| Ok(()))
            .optional()?
            .is_some();
        if exists {
            Err(StoreError::AlreadyTranscribed(video_id))
        } else {
            Err(StoreError::VideoNotFound(video_id))
        }
    }

    /// Move a video to a new status
    ///
    /// Rejects transitions the lifecycle does not allow.
    pub fn update_status(&self, video_id: i64, status: VideoStatus) -> StoreResult<()> {
        let conn = self.conn()?;
        let current: VideoStatus = conn
            .query_row(
                "SELECT status FROM videos WHERE id = ?1",
                params![video_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::VideoNotFound(video_id))?;

        if !current.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: video_id,
                from: current,
                to: status,
            });
        }

        conn.execute(
            "UPDATE videos SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Utc::now(), video_id],
        )?;
        Ok(())
    }

    /// Count videos per status
    pub fn status_counts(&self) -> StoreResult<StatusCounts> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM videos GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, VideoStatus>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let (status, count) = row?;
            let count = usize::try_from(count).unwrap_or_default();
            match status {
                VideoStatus::Pending => counts.pending = count,
                VideoStatus::Published => counts.published = count,
                VideoStatus::Error => counts.error = count,
            }
        }
        Ok(counts)
    }
}

fn map_channel(row: &Row<'_>) -> rusqlite::Result<Channel> {
    Ok(Channel {
        id: row.get(0)?,
        external_handle: row.get(1)?,
        channel_url: row.get(2)?,
    })
}

fn map_video(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        video_url: row.get(2)?,
        title: row.get(3)?,
        transcript: row.get(4)?,
        post_text: row.get(5)?,
        post_media: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let channel_id = db
            .add_channel("idea", "https://www.youtube.com/@davejeltema3")
            .unwrap();
        (db, channel_id)
    }

    #[test]
    fn test_add_channel_is_idempotent() {
        let (db, first) = setup();
        let second = db
            .add_channel("idea", "https://www.youtube.com/@davejeltema3")
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(db.list_channels().unwrap().len(), 1);
    }

    #[test]
    fn test_find_channel_by_url() {
        let (db, id) = setup();
        let channel = db
            .find_channel_by_url("https://www.youtube.com/@davejeltema3")
            .unwrap()
            .unwrap();
        assert_eq!(channel.id, id);
        assert_eq!(channel.external_handle, "idea");
        assert!(db.find_channel_by_url("https://example.com").unwrap().is_none());
    }

    #[test]
    fn test_add_video_defaults_to_pending() {
        let (db, channel_id) = setup();
        assert!(db
            .add_video(channel_id, "https://www.youtube.com/watch?v=a", Some("First"))
            .unwrap());

        let video = db
            .find_video_by_url("https://www.youtube.com/watch?v=a")
            .unwrap()
            .unwrap();
        assert_eq!(video.status, VideoStatus::Pending);
        assert_eq!(video.title.as_deref(), Some("First"));
        assert!(video.transcript.is_none());
        assert!(video.post_text.is_none());
    }

    #[test]
    fn test_duplicate_video_url_is_ignored() {
        let (db, channel_id) = setup();
        let url = "https://www.youtube.com/watch?v=a";
        assert!(db.add_video(channel_id, url, None).unwrap());
        assert!(!db.add_video(channel_id, url, Some("Retitled")).unwrap());

        let videos = db.list_videos_by_status(VideoStatus::Pending).unwrap();
        assert_eq!(videos.len(), 1);
        assert!(videos[0].title.is_none());
    }

    #[test]
    fn test_list_video_urls_is_per_channel() {
        let (db, first) = setup();
        let second = db.add_channel("other", "https://www.youtube.com/@other").unwrap();

        db.add_video(first, "https://www.youtube.com/watch?v=a", None).unwrap();
        db.add_video(first, "https://www.youtube.com/watch?v=b", None).unwrap();
        db.add_video(second, "https://www.youtube.com/watch?v=c", None).unwrap();

        let urls = db.list_video_urls(first).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains("https://www.youtube.com/watch?v=a"));
        assert!(!urls.contains("https://www.youtube.com/watch?v=c"));
    }

    #[test]
    fn test_next_untranscribed_pending_orders_by_id() {
        let (db, channel_id) = setup();
        for v in ["a", "b", "c"] {
            db.add_video(channel_id, &format!("https://www.youtube.com/watch?v={}", v), None)
                .unwrap();
        }

        let first = db.next_untranscribed_pending().unwrap().unwrap();
        db.update_transcript_and_text(first.id, "transcript", "post").unwrap();

        let next = db.next_untranscribed_pending().unwrap().unwrap();
        assert!(next.id > first.id);
        assert!(next.video_url.ends_with("v=b"));
    }

    #[test]
    fn test_transcript_is_written_once() {
        let (db, channel_id) = setup();
        db.add_video(channel_id, "https://www.youtube.com/watch?v=a", None).unwrap();
        let video = db.next_untranscribed_pending().unwrap().unwrap();

        db.update_transcript_and_text(video.id, "first", "first post").unwrap();
        let err = db
            .update_transcript_and_text(video.id, "second", "second post")
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyTranscribed(id) if id == video.id));

        let stored = db.get_video(video.id).unwrap().unwrap();
        assert_eq!(stored.transcript.as_deref(), Some("first"));
        assert_eq!(stored.post_text.as_deref(), Some("first post"));

        assert!(matches!(
            db.update_transcript_and_text(9999, "t", "p"),
            Err(StoreError::VideoNotFound(9999))
        ));
    }

    #[test]
    fn test_list_publishable_requires_post_text() {
        let (db, channel_id) = setup();
        db.add_video(channel_id, "https://www.youtube.com/watch?v=a", None).unwrap();
        db.add_video(channel_id, "https://www.youtube.com/watch?v=b", None).unwrap();

        let b = db
            .find_video_by_url("https://www.youtube.com/watch?v=b")
            .unwrap()
            .unwrap();
        db.update_transcript_and_text(b.id, "transcript", "post").unwrap();

        let publishable = db.list_publishable().unwrap();
        assert_eq!(publishable.len(), 1);
        assert_eq!(publishable[0].id, b.id);
    }

    #[test]
    fn test_update_status_enforces_lifecycle() {
        let (db, channel_id) = setup();
        db.add_video(channel_id, "https://www.youtube.com/watch?v=a", None).unwrap();
        let video = db.next_untranscribed_pending().unwrap().unwrap();

        db.update_status(video.id, VideoStatus::Published).unwrap();
        let err = db.update_status(video.id, VideoStatus::Pending).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: VideoStatus::Published,
                to: VideoStatus::Pending,
                ..
            }
        ));

        assert!(matches!(
            db.update_status(9999, VideoStatus::Error),
            Err(StoreError::VideoNotFound(9999))
        ));
    }

    #[test]
    fn test_error_can_be_reset_to_pending() {
        let (db, channel_id) = setup();
        db.add_video(channel_id, "https://www.youtube.com/watch?v=a", None).unwrap();
        let video = db.next_untranscribed_pending().unwrap().unwrap();

        db.update_status(video.id, VideoStatus::Error).unwrap();
        db.update_status(video.id, VideoStatus::Pending).unwrap();
        assert_eq!(
            db.get_video(video.id).unwrap().unwrap().status,
            VideoStatus::Pending
        );
    }

    #[test]
    fn test_status_counts() {
        let (db, channel_id) = setup();
        for v in ["a", "b", "c"] {
            db.add_video(channel_id, &format!("https://www.youtube.com/watch?v={}", v), None)
                .unwrap();
        }
        let videos = db.list_videos_by_status(VideoStatus::Pending).unwrap();
        db.update_status(videos[0].id, VideoStatus::Published).unwrap();
        db.update_status(videos[1].id, VideoStatus::Error).unwrap();

        let counts = db.status_counts().unwrap();
        assert_eq!(
            counts,
            StatusCounts {
                pending: 1,
                published: 1,
                error: 1
            }
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("tubepost.db");

        let db = Database::open(&path).unwrap();
        db.add_channel("idea", "https://www.youtube.com/@x").unwrap();
        assert!(path.exists());

        // Reopening keeps existing rows
        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.list_channels().unwrap().len(), 1);
    }
}
