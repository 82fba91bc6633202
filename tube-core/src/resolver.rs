use tracing::{debug, info};

use crate::classify::VideoClassifier;
use crate::error::FetchError;
use crate::feed::FeedSource;
use crate::models::{Cursor, VideoRecord};

/// Computes the videos published since `cursor`, oldest first.
///
/// The feed is walked newest to oldest and the walk stops at the cursor's
/// link. Shorts and Premieres are skipped without stopping; a Premiere is
/// re-examined on every call until it airs or leaves the feed window. With no
/// cursor (first run) only the newest normal video is taken.
pub async fn resolve(
    feeds: &dyn FeedSource,
    classifier: &dyn VideoClassifier,
    channel_id: &str,
    cursor: &Cursor,
) -> Result<Vec<VideoRecord>, FetchError> {
    let entries = feeds.fetch_entries(channel_id).await?;
    let last_link = cursor.last_video_link.as_deref();

    let mut accepted = Vec::new();
    for entry in entries {
        if last_link == Some(entry.link.as_str()) {
            debug!(%channel_id, video_id = %entry.video_id, "reached cursor");
            break;
        }

        let classification = classifier.classify(&entry.video_id).await;
        if !classification.is_ingestible() {
            debug!(%channel_id, video_id = %entry.video_id, ?classification, "skipped");
            continue;
        }

        accepted.push(VideoRecord::from(entry));

        if last_link.is_none() {
            break;
        }
    }

    accepted.reverse();
    if !accepted.is_empty() {
        info!(%channel_id, new_videos = accepted.len(), "new videos resolved");
    }
    Ok(accepted)
}
