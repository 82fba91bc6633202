use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::VideoRecord;
use crate::storage::{
    read_json_recovering, read_json_with_tmp_fallback, write_json_atomic, CursorStore,
};

const STATE_FILE: &str = "monitor_state.json";
const VIDEOS_FILE: &str = "videos.json";
const DISCOVERY_LOG: &str = "new_videos.txt";
const SUMMARY_DIR: &str = "summaries";

/// Everything persisted under one data directory: cursor state, the video
/// collection, per-video summaries and the discovery log.
#[derive(Debug, Clone)]
pub struct DataApi {
    dir: PathBuf,
    cursors: CursorStore,
    videos_path: PathBuf,
    log_path: PathBuf,
    summaries_dir: PathBuf,
    // serializes read-modify-write of videos.json within the process
    videos_lock: Arc<Mutex<()>>,
}

impl DataApi {
    pub async fn open(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(error = %e, path = %dir.display(), "failed to create data dir");
        }
        Self {
            cursors: CursorStore::new(dir.join(STATE_FILE)),
            videos_path: dir.join(VIDEOS_FILE),
            log_path: dir.join(DISCOVERY_LOG),
            summaries_dir: dir.join(SUMMARY_DIR),
            videos_lock: Arc::new(Mutex::new(())),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cursors(&self) -> &CursorStore {
        &self.cursors
    }

    pub fn discovery_log_path(&self) -> &Path {
        &self.log_path
    }

    /// Newest-first as stored. A corrupt file reads as empty.
    pub async fn list_videos(&self) -> Vec<VideoRecord> {
        read_json_with_tmp_fallback(&self.videos_path).await
    }

    pub async fn find_video(&self, video_id: &str) -> Option<VideoRecord> {
        self.list_videos()
            .await
            .into_iter()
            .find(|video| video.id == video_id)
    }

    /// Prepends `video` unless a record with the same id exists.
    /// Returns whether it was inserted.
    pub async fn insert_video(&self, video: VideoRecord) -> Result<bool, StoreError> {
        let _guard = self.videos_lock.lock().await;
        let mut videos: Vec<VideoRecord> = read_json_recovering(&self.videos_path).await?;
        if videos.iter().any(|existing| existing.id == video.id) {
            debug!(video_id = %video.id, "video already recorded");
            return Ok(false);
        }
        info!(video_id = %video.id, title = %video.title, "recording video");
        videos.insert(0, video);
        write_json_atomic(&self.videos_path, &videos).await?;
        Ok(true)
    }

    pub async fn toggle_read(&self, video_id: &str) -> Result<VideoRecord, StoreError> {
        let _guard = self.videos_lock.lock().await;
        let mut videos: Vec<VideoRecord> = read_json_recovering(&self.videos_path).await?;
        let video = videos
            .iter_mut()
            .find(|video| video.id == video_id)
            .ok_or_else(|| StoreError::NotFound(video_id.to_owned()))?;
        video.is_read = !video.is_read;
        let updated = video.clone();
        write_json_atomic(&self.videos_path, &videos).await?;
        Ok(updated)
    }

    /// Deletes the given records and rewinds any cursor that pointed at them.
    pub async fn remove_videos(&self, video_ids: &[String]) -> Result<usize, StoreError> {
        let removed = {
            let _guard = self.videos_lock.lock().await;
            let mut videos: Vec<VideoRecord> = read_json_recovering(&self.videos_path).await?;
            let before = videos.len();
            videos.retain(|video| !video_ids.contains(&video.id));
            let removed = before - videos.len();
            if removed > 0 {
                write_json_atomic(&self.videos_path, &videos).await?;
            }
            removed
        };
        for id in video_ids {
            self.cursors.forget_video(id).await?;
        }
        info!(removed, "videos removed");
        Ok(removed)
    }

    /// Reorders the collection newest-published-first. Unparseable dates sort last.
    pub async fn sort_by_published(&self) -> Result<usize, StoreError> {
        let _guard = self.videos_lock.lock().await;
        let mut videos: Vec<VideoRecord> = read_json_recovering(&self.videos_path).await?;
        videos.sort_by_key(|video| Reverse(parse_published(&video.published)));
        write_json_atomic(&self.videos_path, &videos).await?;
        Ok(videos.len())
    }

    fn summary_path(&self, video_id: &str) -> PathBuf {
        self.summaries_dir.join(format!("summary_{video_id}.md"))
    }

    pub async fn save_summary(&self, video_id: &str, content: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.summaries_dir).await?;
        let path = self.summary_path(video_id);
        tokio::fs::write(&path, content).await?;
        info!(%video_id, path = %path.display(), "summary saved");
        Ok(())
    }

    pub async fn load_summary(&self, video_id: &str) -> Option<String> {
        tokio::fs::read_to_string(self.summary_path(video_id)).await.ok()
    }

    pub async fn has_summary(&self, video_id: &str) -> bool {
        tokio::fs::try_exists(self.summary_path(video_id))
            .await
            .unwrap_or(false)
    }

    /// Appends `[<local time>] New Video: <title> - <link>`.
    pub async fn append_discovery(&self, video: &VideoRecord) -> Result<(), StoreError> {
        let line = discovery_line(Local::now(), video);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Removes every persisted artifact so the next pass starts from scratch.
    pub async fn reset(&self) -> Result<(), StoreError> {
        let _guard = self.videos_lock.lock().await;
        for path in [&self.videos_path, self.cursors.path(), &self.log_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => info!(path = %path.display(), "removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        match tokio::fs::remove_dir_all(&self.summaries_dir).await {
            Ok(()) => info!(path = %self.summaries_dir.display(), "removed summaries"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

pub(crate) fn discovery_line(at: DateTime<Local>, video: &VideoRecord) -> String {
    format!(
        "[{}] New Video: {} - {}\n",
        at.format("%Y-%m-%d %H:%M:%S"),
        video.title,
        video.link
    )
}

fn parse_published(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .ok()
}
