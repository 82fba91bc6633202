use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::error::TranscriptError;

/// Caption/transcript retrieval for a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Plain transcript text. Failures keep the upstream message in
    /// [`TranscriptError::Unavailable`].
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, TranscriptError>;
}

pub struct YoutubeTranscripts {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl YoutubeTranscripts {
    /// `client` should carry a request timeout; the upstream default has none.
    pub fn new(client: Client, languages: Vec<String>) -> Result<Self, TranscriptError> {
        let api = YouTubeTranscriptApi::new(None, None, Some(client))
            .map_err(|e| TranscriptError::Client(e.to_string()))?;
        Ok(Self { api, languages })
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscripts {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, TranscriptError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();
        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| TranscriptError::Unavailable(e.to_string()))?;
        debug!(
            %video_id,
            language = %transcript.language_code,
            snippets = transcript.snippets.len(),
            "transcript fetched"
        );
        Ok(transcript.text())
    }
}
