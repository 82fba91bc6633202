use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("feed parsing error: {0}")]
    Parse(#[from] atom_syndication::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("video not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Carries the upstream message verbatim; the Premiere predicate reads it.
    #[error("transcript unavailable: {0}")]
    Unavailable(String),
    #[error("transcript request timed out")]
    Timeout,
    #[error("transcript client error: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summarizer is not configured (missing api key or base url)")]
    NotConfigured,
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("completion endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("completion response had no content")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("scheduler task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("trigger channel closed unexpectedly")]
    TriggerChannelClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}
