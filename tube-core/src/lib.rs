pub mod classify;
pub mod config;
pub mod data;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod manual;
pub mod models;
pub mod poller;
pub mod resolver;
pub mod storage;
pub mod summary;
pub mod transcript;

pub use classify::{is_premiere_message, ProbeClassifier, ShortProbe, VideoClassifier};
pub use config::MonitorConfig;
pub use data::DataApi;
pub use error::{
    ConfigError, FetchError, IngestError, PollError, StoreError, SummaryError, TranscriptError,
};
pub use feed::{extract_channel_id, parse_feed, FeedSource, YoutubeFeeds};
pub use ingest::Ingestor;
pub use manual::{extract_video_id, lookup_video};
pub use models::{CandidateEntry, Classification, Cursor, CursorMap, VideoRecord};
pub use poller::{
    spawn_scheduler, PassGuard, PassReport, PassStatus, SchedulerConfig, SchedulerHandle,
    TriggerOutcome,
};
pub use resolver::resolve;
pub use storage::CursorStore;
pub use summary::{ChatSummarizer, NoopSummarizer, Summarizer};
pub use transcript::{TranscriptSource, YoutubeTranscripts};
