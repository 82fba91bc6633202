use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-channel pointer to the last successfully ingested video.
///
/// `last_video_link == None` means the channel was never ingested and the
/// resolver runs in first-run mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cursor {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub last_video_link: Option<String>,
    #[serde(default)]
    pub last_video_title: Option<String>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Cursor {
    pub fn is_first_run(&self) -> bool {
        self.last_video_link.is_none()
    }

    pub fn advance_to(&mut self, video: &VideoRecord, checked_at: DateTime<Utc>) {
        self.last_video_link = Some(video.link.clone());
        self.last_video_title = Some(video.title.clone());
        self.last_checked = Some(checked_at);
    }

    /// Forget the last video but keep the cached channel id.
    pub fn clear_position(&mut self) {
        self.last_video_link = None;
        self.last_video_title = None;
        self.last_checked = None;
    }
}

/// Channel URL -> cursor. Ordered so the file on disk stays stable.
pub type CursorMap = BTreeMap<String, Cursor>;

/// A persisted video. Stored newest-first, unique by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub link: String,
    pub published: String,
    pub channel_title: String,
    #[serde(default)]
    pub has_summary: bool,
    #[serde(default)]
    pub is_read: bool,
}

/// One entry of a channel feed, newest-first as the feed lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    pub video_id: String,
    pub link: String,
    pub title: String,
    pub published: String,
    pub channel_title: String,
}

impl From<CandidateEntry> for VideoRecord {
    fn from(entry: CandidateEntry) -> Self {
        Self {
            id: entry.video_id,
            title: entry.title,
            link: entry.link,
            published: entry.published,
            channel_title: entry.channel_title,
            has_summary: false,
            is_read: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Normal,
    Short,
    Premiere,
    /// The probes were inconclusive; processed like `Normal`.
    Unknown,
}

impl Classification {
    pub fn is_ingestible(self) -> bool {
        matches!(self, Classification::Normal | Classification::Unknown)
    }
}
