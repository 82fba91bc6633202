use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::CursorMap;

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Reads JSON from `path`, falling back to `<path>.tmp`, then to `T::default()`.
pub(crate) async fn read_json_with_tmp_fallback<T: DeserializeOwned + Default>(path: &Path) -> T {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to parse JSON, trying tmp fallback");
                match tokio::fs::read(tmp_path(path)).await {
                    Ok(tmp_bytes) => serde_json::from_slice::<T>(&tmp_bytes).unwrap_or_default(),
                    Err(_) => T::default(),
                }
            }
        },
        Err(_) => T::default(),
    }
}

/// Read side of a read-modify-write. A corrupt file is replaced by
/// `<path>.tmp` if that parses; otherwise it is moved aside to
/// `<path>.corrupt-<timestamp>` and the caller starts from `T::default()`.
pub(crate) async fn read_json_recovering<T: DeserializeOwned + Default>(
    path: &Path,
) -> Result<T, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };
    let parse_err = match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };
    warn!(error = %parse_err, path = %path.display(), "failed to parse JSON, trying tmp fallback");

    if let Ok(tmp_bytes) = tokio::fs::read(tmp_path(path)).await {
        if let Ok(value) = serde_json::from_slice::<T>(&tmp_bytes) {
            info!(path = %path.display(), "recovered from tmp file");
            return Ok(value);
        }
    }

    let backup = corrupt_backup_path(path, Utc::now());
    tokio::fs::rename(path, &backup).await?;
    warn!(
        path = %path.display(),
        backup = %backup.display(),
        "corrupt file moved aside, starting empty"
    );
    Ok(T::default())
}

fn corrupt_backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".corrupt-{}", at.format("%Y%m%dT%H%M%S%.3fZ")));
    path.with_file_name(name)
}

/// Writes `<path>.tmp` then renames it over `path`.
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Per-channel cursor state, persisted as one JSON object keyed by channel URL.
///
/// Every `save` rewrites the whole mapping; the ingestion driver is the only
/// writer and saves after each video.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absent or unparseable state yields an empty mapping.
    pub async fn load(&self) -> CursorMap {
        read_json_with_tmp_fallback(&self.path).await
    }

    pub async fn save(&self, cursors: &CursorMap) -> Result<(), StoreError> {
        write_json_atomic(&self.path, cursors).await?;
        debug!(path = %self.path.display(), channels = cursors.len(), "cursor state saved");
        Ok(())
    }

    /// Clears the last-video fields of one channel, keeping its channel id.
    /// Returns `false` if the channel has no cursor.
    pub async fn reset_channel(&self, channel_url: &str) -> Result<bool, StoreError> {
        let mut cursors = self.load().await;
        let Some(cursor) = cursors.get_mut(channel_url) else {
            return Ok(false);
        };
        cursor.clear_position();
        self.save(&cursors).await?;
        info!(channel = %channel_url, "cursor reset");
        Ok(true)
    }

    /// Resets every cursor currently pointing at `video_id`, so the channel
    /// re-discovers from its feed on the next pass.
    pub async fn forget_video(&self, video_id: &str) -> Result<usize, StoreError> {
        let mut cursors = self.load().await;
        let mut reset = 0;
        for (channel, cursor) in cursors.iter_mut() {
            let points_at_video = cursor
                .last_video_link
                .as_deref()
                .is_some_and(|link| link.contains(video_id));
            if points_at_video {
                info!(%channel, %video_id, "resetting cursor that pointed at removed video");
                cursor.clear_position();
                reset += 1;
            }
        }
        if reset > 0 {
            self.save(&cursors).await?;
        }
        Ok(reset)
    }
}
