#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tube_core::{
    CandidateEntry, Classification, DataApi, FeedSource, FetchError, Ingestor, Summarizer,
    VideoClassifier,
};

pub fn video_id(n: u32) -> String {
    format!("vid{n:08}")
}

pub fn link(n: u32) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id(n))
}

pub fn entry(n: u32) -> CandidateEntry {
    CandidateEntry {
        video_id: video_id(n),
        link: link(n),
        title: format!("Video {n}"),
        published: format!("2025-01-{n:02}T12:00:00+00:00"),
        channel_title: "Test Channel".into(),
    }
}

/// Entries in the order given, which callers pass newest-first.
pub fn feed(numbers: &[u32]) -> Vec<CandidateEntry> {
    numbers.iter().copied().map(entry).collect()
}

#[derive(Default)]
pub struct StubFeeds {
    entries: Mutex<HashMap<String, Vec<CandidateEntry>>>,
    failing: Mutex<Vec<String>>,
    channel_ids: Mutex<HashMap<String, String>>,
    pub fetch_calls: AtomicUsize,
    pub resolve_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StubFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_feed(&self, channel_id: &str, entries: Vec<CandidateEntry>) {
        self.entries
            .lock()
            .unwrap()
            .insert(channel_id.to_owned(), entries);
    }

    pub fn fail(&self, channel_id: &str) {
        self.failing.lock().unwrap().push(channel_id.to_owned());
    }

    pub fn set_channel_id(&self, channel_url: &str, channel_id: &str) {
        self.channel_ids
            .lock()
            .unwrap()
            .insert(channel_url.to_owned(), channel_id.to_owned());
    }
}

#[async_trait]
impl FeedSource for StubFeeds {
    async fn fetch_entries(&self, channel_id: &str) -> Result<Vec<CandidateEntry>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().iter().any(|c| c == channel_id) {
            return Err(FetchError::Status {
                status: StatusCode::BAD_GATEWAY,
                url: format!("stub://{channel_id}"),
            });
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn resolve_channel_id(&self, channel_url: &str) -> Option<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.channel_ids.lock().unwrap().get(channel_url).cloned()
    }
}

/// Everything is `Normal` unless told otherwise.
#[derive(Default)]
pub struct StubClassifier {
    overrides: Mutex<HashMap<String, Classification>>,
    pub calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, video_id: &str, classification: Classification) {
        self.overrides
            .lock()
            .unwrap()
            .insert(video_id.to_owned(), classification);
    }
}

#[async_trait]
impl VideoClassifier for StubClassifier {
    async fn classify(&self, video_id: &str) -> Classification {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.overrides
            .lock()
            .unwrap()
            .get(video_id)
            .copied()
            .unwrap_or(Classification::Normal)
    }
}

pub struct StubSummarizer {
    reply: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubSummarizer {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_owned()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, video_id: &str, _title: &str) -> Option<String> {
        self.calls.lock().unwrap().push(video_id.to_owned());
        self.reply.clone()
    }
}

pub struct Harness {
    pub feeds: Arc<StubFeeds>,
    pub classifier: Arc<StubClassifier>,
    pub summarizer: Arc<StubSummarizer>,
    pub ingestor: Ingestor,
}

pub async fn harness(
    dir: &Path,
    channels: &[&str],
    feeds: StubFeeds,
    summarizer: StubSummarizer,
) -> Harness {
    let feeds = Arc::new(feeds);
    let classifier = Arc::new(StubClassifier::new());
    let summarizer = Arc::new(summarizer);
    let data = DataApi::open(dir).await;
    let ingestor = Ingestor::new(
        channels.iter().map(|c| c.to_string()).collect(),
        feeds.clone(),
        classifier.clone(),
        summarizer.clone(),
        data,
    );
    Harness {
        feeds,
        classifier,
        summarizer,
        ingestor,
    }
}
