use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::classify::VideoClassifier;
use crate::data::DataApi;
use crate::error::{IngestError, StoreError};
use crate::feed::FeedSource;
use crate::models::{CursorMap, VideoRecord};
use crate::resolver::resolve;
use crate::summary::Summarizer;

/// Walks every configured channel and records its new videos one at a time.
///
/// After each video the cursor is saved, so a crash loses at most the video
/// being processed and the next pass resumes right after the last one
/// recorded. Callers must not run two passes at once against the same data
/// directory; the scheduler's pass guard enforces that.
pub struct Ingestor {
    channels: Vec<String>,
    feeds: Arc<dyn FeedSource>,
    classifier: Arc<dyn VideoClassifier>,
    summarizer: Arc<dyn Summarizer>,
    data: DataApi,
}

impl Ingestor {
    pub fn new(
        channels: Vec<String>,
        feeds: Arc<dyn FeedSource>,
        classifier: Arc<dyn VideoClassifier>,
        summarizer: Arc<dyn Summarizer>,
        data: DataApi,
    ) -> Self {
        Self {
            channels,
            feeds,
            classifier,
            summarizer,
            data,
        }
    }

    pub fn data(&self) -> &DataApi {
        &self.data
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// One pass over all channels. Returns the number of videos recorded.
    /// A failing channel is logged and skipped.
    pub async fn ingest_pass(&self) -> usize {
        info!(channels = self.channels.len(), "checking channels for new videos");
        let mut cursors = self.data.cursors().load().await;
        let mut total = 0;

        for channel_url in &self.channels {
            match self.ingest_channel(channel_url, &mut cursors).await {
                Ok(count) => total += count,
                Err(err) => warn!(channel = %channel_url, error = %err, "channel check failed"),
            }
        }

        if total == 0 {
            info!("no new videos");
        } else {
            info!(new_videos = total, "check finished");
        }
        total
    }

    async fn ingest_channel(
        &self,
        channel_url: &str,
        cursors: &mut CursorMap,
    ) -> Result<usize, IngestError> {
        let Some(channel_id) = self.channel_id_for(channel_url, cursors).await? else {
            return Ok(0);
        };

        let cursor = cursors.get(channel_url).cloned().unwrap_or_default();
        let new_videos = resolve(
            self.feeds.as_ref(),
            self.classifier.as_ref(),
            &channel_id,
            &cursor,
        )
        .await?;

        let mut count = 0;
        for video in new_videos {
            self.ingest_video(channel_url, video, cursors).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Cached id if present; otherwise resolves it and persists only the id.
    async fn channel_id_for(
        &self,
        channel_url: &str,
        cursors: &mut CursorMap,
    ) -> Result<Option<String>, StoreError> {
        if let Some(id) = cursors.get(channel_url).and_then(|c| c.channel_id.clone()) {
            return Ok(Some(id));
        }

        let Some(id) = self.feeds.resolve_channel_id(channel_url).await else {
            warn!(channel = %channel_url, "channel id unresolved, retrying next pass");
            return Ok(None);
        };

        info!(channel = %channel_url, channel_id = %id, "channel id resolved");
        cursors.entry(channel_url.to_owned()).or_default().channel_id = Some(id.clone());
        self.data.cursors().save(cursors).await?;
        Ok(Some(id))
    }

    async fn ingest_video(
        &self,
        channel_url: &str,
        video: VideoRecord,
        cursors: &mut CursorMap,
    ) -> Result<(), StoreError> {
        info!(channel = %channel_url, video_id = %video.id, title = %video.title, "new video");

        let video = self.record(video).await?;

        cursors
            .entry(channel_url.to_owned())
            .or_default()
            .advance_to(&video, Utc::now());
        self.data.cursors().save(cursors).await?;

        if let Err(err) = self.data.append_discovery(&video).await {
            warn!(video_id = %video.id, error = %err, "failed to append discovery log");
        }
        Ok(())
    }

    /// Manual ingestion: summarize and record without touching any cursor.
    /// Returns `false` if the video was already recorded.
    pub async fn add_video(&self, video: VideoRecord) -> Result<bool, StoreError> {
        if self.data.find_video(&video.id).await.is_some() {
            return Ok(false);
        }
        self.record(video).await?;
        Ok(true)
    }

    /// Summarizes (best-effort) and inserts if absent.
    async fn record(&self, mut video: VideoRecord) -> Result<VideoRecord, StoreError> {
        video.has_summary = self.ensure_summary(&video).await;
        self.data.insert_video(video.clone()).await?;
        Ok(video)
    }

    async fn ensure_summary(&self, video: &VideoRecord) -> bool {
        if self.data.has_summary(&video.id).await {
            info!(video_id = %video.id, "summary already on disk");
            return true;
        }
        let Some(summary) = self.summarizer.summarize(&video.id, &video.title).await else {
            warn!(video_id = %video.id, "recording video without summary");
            return false;
        };
        match self.data.save_summary(&video.id, &summary).await {
            Ok(()) => true,
            Err(err) => {
                warn!(video_id = %video.id, error = %err, "failed to save summary");
                false
            }
        }
    }
}
