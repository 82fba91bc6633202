use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::error::{SummaryError, TranscriptError};
use crate::transcript::TranscriptSource;

/// Produces a summary for a video, or nothing. Never raises.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, video_id: &str, title: &str) -> Option<String>;
}

/// Stands in when no completion endpoint is configured.
pub struct NoopSummarizer;

#[async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _video_id: &str, _title: &str) -> Option<String> {
        None
    }
}

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const SUMMARY_INSTRUCTIONS: &str = "You analyse YouTube videos from their transcript. Write in Markdown, \
without XML tags, using exactly these sections:\n\
## Summary\nA thorough summary: background, core arguments, concrete examples and proposed solutions.\n\
## Key Questions\nA numbered list of the main questions the video discusses.\n\
## Organized Notes\nBold sub-headings grouping the content, with bullet points under each.\n\
## Highlight\nOne insightful sentence capturing the most distinctive idea of the video.";

/// Summaries from an OpenAI-compatible chat completions endpoint.
pub struct ChatSummarizer {
    client: Client,
    config: LlmConfig,
    transcripts: Arc<dyn TranscriptSource>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

impl ChatSummarizer {
    pub fn new(client: Client, config: LlmConfig, transcripts: Arc<dyn TranscriptSource>) -> Self {
        Self {
            client,
            config,
            transcripts,
        }
    }

    fn endpoint(&self) -> Option<(String, &str)> {
        let base = self.config.base_url.as_deref().filter(|b| !b.is_empty())?;
        let key = self.config.api_key.as_deref().filter(|k| !k.is_empty())?;
        Some((
            format!("{}/chat/completions", base.trim_end_matches('/')),
            key,
        ))
    }

    pub async fn try_summarize(&self, video_id: &str, title: &str) -> Result<String, SummaryError> {
        let (url, key) = self.endpoint().ok_or(SummaryError::NotConfigured)?;

        let mut transcript = tokio::time::timeout(
            self.config.timeout(),
            self.transcripts.fetch_transcript(video_id),
        )
        .await
        .unwrap_or(Err(TranscriptError::Timeout))?;
        if let Some((cut, _)) = transcript.char_indices().nth(self.config.max_transcript_chars) {
            warn!(%video_id, chars = self.config.max_transcript_chars, "transcript too long, truncating");
            transcript.truncate(cut);
        }

        let prompt =
            format!("{SUMMARY_INSTRUCTIONS}\n\nVideo title: {title}\n\nTranscript:\n{transcript}");
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SummaryError::Status(status));
        }
        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(SummaryError::EmptyResponse)
    }
}

#[async_trait]
impl Summarizer for ChatSummarizer {
    async fn summarize(&self, video_id: &str, title: &str) -> Option<String> {
        info!(%video_id, %title, "generating summary");
        match self.try_summarize(video_id, title).await {
            Ok(summary) => Some(summary),
            Err(SummaryError::NotConfigured) => {
                warn!("LLM_API_KEY or LLM_BASE_URL not set, skipping summary");
                None
            }
            Err(err) => {
                warn!(%video_id, error = %err, "summary generation failed");
                None
            }
        }
    }
}
