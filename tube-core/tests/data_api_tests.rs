use tempfile::tempdir;
use tube_core::{Cursor, CursorMap, DataApi, StoreError, VideoRecord};

fn video(id: &str, published: &str) -> VideoRecord {
    VideoRecord {
        id: id.into(),
        title: format!("Title {id}"),
        link: format!("https://www.youtube.com/watch?v={id}"),
        published: published.into(),
        channel_title: "Channel".into(),
        has_summary: false,
        is_read: false,
    }
}

fn ids(videos: &[VideoRecord]) -> Vec<&str> {
    videos.iter().map(|v| v.id.as_str()).collect()
}

#[tokio::test]
async fn insert_prepends_and_ignores_duplicates() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;

    assert!(data.insert_video(video("aaaaaaaaaaa", "2025-01-01T00:00:00Z")).await.unwrap());
    assert!(data.insert_video(video("bbbbbbbbbbb", "2025-01-02T00:00:00Z")).await.unwrap());

    let mut dup = video("aaaaaaaaaaa", "2025-01-01T00:00:00Z");
    dup.title = "changed".into();
    assert!(!data.insert_video(dup).await.unwrap());

    let videos = data.list_videos().await;
    assert_eq!(ids(&videos), vec!["bbbbbbbbbbb", "aaaaaaaaaaa"]);
    assert_eq!(videos[1].title, "Title aaaaaaaaaaa");
}

#[tokio::test]
async fn toggle_read_flips_the_flag() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;
    data.insert_video(video("aaaaaaaaaaa", "2025-01-01T00:00:00Z"))
        .await
        .unwrap();

    assert!(data.toggle_read("aaaaaaaaaaa").await.unwrap().is_read);
    assert!(data.find_video("aaaaaaaaaaa").await.unwrap().is_read);
    assert!(!data.toggle_read("aaaaaaaaaaa").await.unwrap().is_read);
}

#[tokio::test]
async fn toggle_read_of_unknown_video_is_not_found() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;

    let err = data.toggle_read("zzzzzzzzzzz").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == "zzzzzzzzzzz"));
}

#[tokio::test]
async fn remove_videos_rewinds_cursors_pointing_at_them() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;
    data.insert_video(video("aaaaaaaaaaa", "2025-01-01T00:00:00Z"))
        .await
        .unwrap();
    data.insert_video(video("bbbbbbbbbbb", "2025-01-02T00:00:00Z"))
        .await
        .unwrap();

    let mut cursors = CursorMap::new();
    cursors.insert(
        "https://www.youtube.com/@one".into(),
        Cursor {
            channel_id: Some("UC_one".into()),
            last_video_link: Some("https://www.youtube.com/watch?v=bbbbbbbbbbb".into()),
            last_video_title: Some("Title bbbbbbbbbbb".into()),
            last_checked: None,
        },
    );
    cursors.insert(
        "https://www.youtube.com/@two".into(),
        Cursor {
            channel_id: Some("UC_two".into()),
            last_video_link: Some("https://www.youtube.com/watch?v=ccccccccccc".into()),
            last_video_title: None,
            last_checked: None,
        },
    );
    data.cursors().save(&cursors).await.unwrap();

    let removed = data
        .remove_videos(&["bbbbbbbbbbb".to_string(), "missingxxxx".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(ids(&data.list_videos().await), vec!["aaaaaaaaaaa"]);

    let cursors = data.cursors().load().await;
    let one = &cursors["https://www.youtube.com/@one"];
    assert!(one.is_first_run());
    assert_eq!(one.channel_id.as_deref(), Some("UC_one"));
    assert!(!cursors["https://www.youtube.com/@two"].is_first_run());
}

#[tokio::test]
async fn reset_channel_keeps_channel_id() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;
    let mut cursors = CursorMap::new();
    cursors.insert(
        "https://www.youtube.com/@one".into(),
        Cursor {
            channel_id: Some("UC_one".into()),
            last_video_link: Some("https://www.youtube.com/watch?v=aaaaaaaaaaa".into()),
            last_video_title: Some("t".into()),
            last_checked: Some(chrono::Utc::now()),
        },
    );
    data.cursors().save(&cursors).await.unwrap();

    assert!(data
        .cursors()
        .reset_channel("https://www.youtube.com/@one")
        .await
        .unwrap());
    assert!(!data
        .cursors()
        .reset_channel("https://www.youtube.com/@unknown")
        .await
        .unwrap());

    let cursor = data.cursors().load().await["https://www.youtube.com/@one"].clone();
    assert_eq!(
        cursor,
        Cursor {
            channel_id: Some("UC_one".into()),
            ..Cursor::default()
        }
    );
}

#[tokio::test]
async fn sort_orders_newest_published_first() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;
    data.insert_video(video("newest00000", "2025-03-01T10:00:00+00:00"))
        .await
        .unwrap();
    data.insert_video(video("garbage0000", "not a date"))
        .await
        .unwrap();
    data.insert_video(video("oldest00000", "2024-12-31T23:00:00"))
        .await
        .unwrap();
    data.insert_video(video("middle00000", "2025-02-01T08:00:00+09:00"))
        .await
        .unwrap();

    assert_eq!(data.sort_by_published().await.unwrap(), 4);
    assert_eq!(
        ids(&data.list_videos().await),
        vec!["newest00000", "middle00000", "oldest00000", "garbage0000"]
    );
}

#[tokio::test]
async fn summaries_round_trip_through_the_summaries_dir() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;

    assert!(!data.has_summary("aaaaaaaaaaa").await);
    assert!(data.load_summary("aaaaaaaaaaa").await.is_none());

    data.save_summary("aaaaaaaaaaa", "## Summary\ntext").await.unwrap();

    assert!(data.has_summary("aaaaaaaaaaa").await);
    assert!(dir
        .path()
        .join("summaries")
        .join("summary_aaaaaaaaaaa.md")
        .exists());
}

#[tokio::test]
async fn reset_removes_every_artifact() {
    let dir = tempdir().unwrap();
    let data = DataApi::open(dir.path()).await;
    let v = video("aaaaaaaaaaa", "2025-01-01T00:00:00Z");
    data.insert_video(v.clone()).await.unwrap();
    data.save_summary(&v.id, "s").await.unwrap();
    data.append_discovery(&v).await.unwrap();
    data.cursors().save(&CursorMap::new()).await.unwrap();

    data.reset().await.unwrap();
    // a second reset on an empty directory is fine
    data.reset().await.unwrap();

    assert!(data.list_videos().await.is_empty());
    assert!(!data.has_summary(&v.id).await);
    assert!(!data.discovery_log_path().exists());
    assert!(!data.cursors().path().exists());
}
