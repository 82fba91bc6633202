use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::error::FetchError;
use crate::models::VideoRecord;

static VIDEO_ID_IN_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("video id pattern is valid"));
static BARE_VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z_-]{11}$").expect("bare id pattern is valid"));
static PAGE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<title>(.*?) - YouTube</title>").expect("title pattern is valid"));
static PAGE_AUTHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""author":"(.*?)""#).expect("author pattern is valid"));

/// Accepts a bare 11-character id or a URL carrying one.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_VIDEO_ID.is_match(input) {
        return Some(input.to_owned());
    }
    if !(input.contains("youtube.com") || input.contains("youtu.be")) {
        return None;
    }
    VIDEO_ID_IN_URL
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Builds a record from the watch page; falls back to placeholder metadata
/// when the page cannot be fetched.
pub async fn lookup_video(client: &Client, watch_url: &str, video_id: &str) -> VideoRecord {
    let link = format!("https://www.youtube.com/watch?v={video_id}");
    match fetch_watch_page(client, watch_url, video_id).await {
        Ok(page) => {
            let title = PAGE_TITLE
                .captures(&page)
                .and_then(|caps| caps.get(1))
                .map(|m| html_escape::decode_html_entities(m.as_str().trim()).into_owned())
                .unwrap_or_else(|| format!("Video {video_id}"));
            let channel_title = PAGE_AUTHOR
                .captures(&page)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_owned())
                .unwrap_or_else(|| "Unknown Channel".to_owned());
            VideoRecord {
                id: video_id.to_owned(),
                title,
                link,
                published: Utc::now().to_rfc3339(),
                channel_title,
                has_summary: false,
                is_read: false,
            }
        }
        Err(err) => {
            warn!(%video_id, error = %err, "failed to fetch video info");
            VideoRecord {
                id: video_id.to_owned(),
                title: format!("Manual Added Video {video_id}"),
                link,
                published: Utc::now().to_rfc3339(),
                channel_title: "Manual Add".to_owned(),
                has_summary: false,
                is_read: false,
            }
        }
    }
}

async fn fetch_watch_page(
    client: &Client,
    watch_url: &str,
    video_id: &str,
) -> Result<String, FetchError> {
    let url = Url::parse_with_params(watch_url, &[("v", video_id)])?;
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status,
            url: url.into(),
        });
    }
    Ok(response.text().await?)
}
