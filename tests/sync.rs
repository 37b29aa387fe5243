//! Synchronizer Integration Tests
//!
//! Catalog → store diffing: only unseen URLs are inserted, and repeated
//! runs without upstream change insert nothing.

mod common;

use std::sync::Arc;

use common::{catalog, uploads_for, url, FakeCatalog};
use tempfile::TempDir;
use tubepost::store::Database;
use tubepost::{Channel, Synchronizer, VideoStatus};

const CHANNEL_URL: &str = "https://www.youtube.com/@CaseyZander";

fn register(store: &Database) -> Channel {
    store.add_channel("relationship", CHANNEL_URL).unwrap();
    store.find_channel_by_url(CHANNEL_URL).unwrap().unwrap()
}

#[tokio::test]
async fn test_second_sync_inserts_nothing() {
    let api = Arc::new(FakeCatalog::new().with_channel(
        "CaseyZander",
        "UC-casey",
        &[&["v1", "v2"], &["v3"]],
    ));
    let store = Database::open_in_memory().unwrap();
    let channel = register(&store);
    let sync = Synchronizer::new(store.clone(), catalog(api));

    assert_eq!(sync.sync(&channel).await.unwrap(), 3);
    assert_eq!(sync.sync(&channel).await.unwrap(), 0);
    assert_eq!(store.status_counts().unwrap().total(), 3);
}

#[tokio::test]
async fn test_inserts_only_unseen_videos() {
    let api = Arc::new(FakeCatalog::new().with_channel(
        "CaseyZander",
        "UC-casey",
        &[&["v1", "v2", "v3"]],
    ));
    let store = Database::open_in_memory().unwrap();
    let channel = register(&store);
    assert!(store.add_video(channel.id, &url("v2"), None).unwrap());

    let sync = Synchronizer::new(store.clone(), catalog(api));
    assert_eq!(sync.sync(&channel).await.unwrap(), 2);

    let v1 = store.find_video_by_url(&url("v1")).unwrap().unwrap();
    let v3 = store.find_video_by_url(&url("v3")).unwrap().unwrap();
    assert_eq!(v1.status, VideoStatus::Pending);
    assert_eq!(v3.status, VideoStatus::Pending);
    assert_eq!(v1.channel_id, channel.id);
    assert_eq!(v1.title.as_deref(), Some("Video v1"));
    assert!(v1.transcript.is_none());
    assert!(v1.post_text.is_none());

    // Live order is preserved as insertion order
    assert!(v1.id < v3.id);
}

#[tokio::test]
async fn test_picks_up_new_uploads() {
    let api = Arc::new(FakeCatalog::new().with_channel(
        "CaseyZander",
        "UC-casey",
        &[&["v1", "v2"]],
    ));
    let store = Database::open_in_memory().unwrap();
    let channel = register(&store);
    let sync = Synchronizer::new(store.clone(), catalog(Arc::clone(&api)));

    assert_eq!(sync.sync(&channel).await.unwrap(), 2);

    api.set_pages(&uploads_for("UC-casey"), &[&["v4", "v1"], &["v2"]]);
    assert_eq!(sync.sync(&channel).await.unwrap(), 1);
    assert!(store.find_video_by_url(&url("v4")).unwrap().is_some());
}

#[tokio::test]
async fn test_unreachable_channel_inserts_nothing() {
    let api = Arc::new(FakeCatalog::new());
    let store = Database::open_in_memory().unwrap();
    let channel = register(&store);
    let sync = Synchronizer::new(store.clone(), catalog(api));

    assert_eq!(sync.sync(&channel).await.unwrap(), 0);
    assert_eq!(store.status_counts().unwrap().total(), 0);
}

#[tokio::test]
async fn test_sync_state_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("state").join("tubepost.db");
    let api = Arc::new(FakeCatalog::new().with_channel(
        "CaseyZander",
        "UC-casey",
        &[&["v1"], &["v2"]],
    ));

    {
        let store = Database::open(&db_path).unwrap();
        let channel = register(&store);
        let sync = Synchronizer::new(store, catalog(Arc::clone(&api)));
        assert_eq!(sync.sync(&channel).await.unwrap(), 2);
    }

    let store = Database::open(&db_path).unwrap();
    let channel = register(&store);
    let sync = Synchronizer::new(store, catalog(api));
    assert_eq!(sync.sync(&channel).await.unwrap(), 0);
}
