use async_trait::async_trait;
use atom_syndication::{Entry, Feed};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::FetchError;
use crate::models::CandidateEntry;

/// Where channel feeds and channel ids come from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Entries of the channel feed, newest first.
    async fn fetch_entries(&self, channel_id: &str) -> Result<Vec<CandidateEntry>, FetchError>;

    /// Looks the platform channel id up from the channel page. `None` means
    /// "try again next cycle" and must never be cached.
    async fn resolve_channel_id(&self, channel_url: &str) -> Option<String>;
}

/// Public channel feed (`videos.xml?channel_id=…`) and channel pages over HTTP.
#[derive(Debug, Clone)]
pub struct YoutubeFeeds {
    client: Client,
    feed_url: String,
}

impl YoutubeFeeds {
    /// `client` should carry the request timeout.
    pub fn new(client: Client, feed_url: impl Into<String>) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
        }
    }

    async fn fetch_page(&self, channel_url: &str) -> Result<String, FetchError> {
        let response = self.client.get(channel_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: channel_url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FeedSource for YoutubeFeeds {
    async fn fetch_entries(&self, channel_id: &str) -> Result<Vec<CandidateEntry>, FetchError> {
        let url = Url::parse_with_params(&self.feed_url, &[("channel_id", channel_id)])?;
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.into(),
            });
        }
        let bytes = response.bytes().await?;
        let entries = parse_feed(&bytes)?;
        debug!(%channel_id, entries = entries.len(), "feed fetched");
        Ok(entries)
    }

    async fn resolve_channel_id(&self, channel_url: &str) -> Option<String> {
        match self.fetch_page(channel_url).await {
            Ok(page) => {
                let id = extract_channel_id(&page);
                if id.is_none() {
                    warn!(channel = %channel_url, "no channel id found in channel page");
                }
                id
            }
            Err(err) => {
                warn!(channel = %channel_url, error = %err, "failed to fetch channel page");
                None
            }
        }
    }
}

/// Parses an Atom channel feed, keeping feed order. Entries without a video
/// id are skipped.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<CandidateEntry>, FetchError> {
    let feed = Feed::read_from(bytes)?;
    Ok(feed.entries().iter().filter_map(candidate_from_entry).collect())
}

fn candidate_from_entry(entry: &Entry) -> Option<CandidateEntry> {
    let video_id = video_id_of(entry)?;

    let link = entry
        .links()
        .iter()
        .find(|link| link.rel() == "alternate")
        .or_else(|| entry.links().first())
        .map(|link| link.href().to_owned())
        .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={video_id}"));

    let published = entry
        .published()
        .unwrap_or_else(|| entry.updated())
        .to_rfc3339();

    let channel_title = entry
        .authors()
        .first()
        .map(|author| author.name().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_owned());

    Some(CandidateEntry {
        video_id,
        link,
        title: entry.title().value.clone(),
        published,
        channel_title,
    })
}

fn video_id_of(entry: &Entry) -> Option<String> {
    let from_extension = entry
        .extensions()
        .get("yt")
        .and_then(|elements| elements.get("videoId"))
        .and_then(|values| values.first())
        .and_then(|ext| ext.value())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToOwned::to_owned);

    from_extension.or_else(|| {
        entry
            .id()
            .strip_prefix("yt:video:")
            .filter(|id| !id.is_empty())
            .map(ToOwned::to_owned)
    })
}

/// One way of spotting the channel id inside a channel page.
pub struct ChannelIdMatcher {
    pub name: &'static str,
    pattern: Regex,
}

impl ChannelIdMatcher {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("channel id pattern is valid"),
        }
    }

    pub fn find(&self, page: &str) -> Option<String> {
        self.pattern
            .captures(page)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
    }
}

/// Most specific first.
pub static CHANNEL_ID_MATCHERS: Lazy<Vec<ChannelIdMatcher>> = Lazy::new(|| {
    vec![
        ChannelIdMatcher::new("meta", r#"itemprop="channelId" content="([^"]+)""#),
        ChannelIdMatcher::new("channel_id_json", r#""channelId":"([^"]+)""#),
        ChannelIdMatcher::new("external_id_json", r#""externalId":"([^"]+)""#),
        ChannelIdMatcher::new("browse_id_json", r#""browseId":"(UC[^"]+)""#),
    ]
});

pub fn extract_channel_id(page: &str) -> Option<String> {
    CHANNEL_ID_MATCHERS.iter().find_map(|matcher| {
        let id = matcher.find(page)?;
        debug!(matcher = matcher.name, %id, "channel id matched");
        Some(id)
    })
}
