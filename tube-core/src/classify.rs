use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client, ClientBuilder};
use tracing::{debug, info};

use crate::error::TranscriptError;
use crate::models::Classification;
use crate::transcript::TranscriptSource;

/// Decides whether a video id is a Short, a Premiere, or a normal upload.
/// Never fails; inconclusive probes fall back to the conservative answer.
#[async_trait]
pub trait VideoClassifier: Send + Sync {
    async fn classify(&self, video_id: &str) -> Classification;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortProbe {
    Short,
    NotShort,
    Ambiguous,
}

/// The upstream transcript service only signals an unreleased Premiere in
/// its error text.
pub fn is_premiere_message(message: &str) -> bool {
    message.contains("Premieres in")
}

pub struct ProbeClassifier {
    client: Client,
    shorts_base: String,
    transcripts: Arc<dyn TranscriptSource>,
    probe_timeout: Duration,
}

impl ProbeClassifier {
    pub fn new(
        shorts_base: impl Into<String>,
        transcripts: Arc<dyn TranscriptSource>,
        probe_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .redirect(redirect::Policy::none())
            .timeout(probe_timeout)
            .user_agent("Mozilla/5.0")
            .build()?;
        Ok(Self {
            client,
            shorts_base: shorts_base.into(),
            transcripts,
            probe_timeout,
        })
    }

    /// HEAD on the shorts endpoint without following redirects: 2xx is a
    /// Short, a redirect is a regular video, anything else is ambiguous.
    pub async fn probe_short(&self, video_id: &str) -> ShortProbe {
        let url = format!("{}{}", self.shorts_base, video_id);
        match self.client.head(&url).send().await {
            Ok(response) if response.status().is_success() => ShortProbe::Short,
            Ok(response) if response.status().is_redirection() => ShortProbe::NotShort,
            Ok(response) => {
                debug!(%video_id, status = %response.status(), "ambiguous shorts probe");
                ShortProbe::Ambiguous
            }
            Err(err) => {
                debug!(%video_id, error = %err, "shorts probe failed");
                ShortProbe::Ambiguous
            }
        }
    }

    /// Only the "Premieres in …" failure counts; missing captions do not.
    pub async fn probe_premiere(&self, video_id: &str) -> bool {
        let outcome = tokio::time::timeout(
            self.probe_timeout,
            self.transcripts.fetch_transcript(video_id),
        )
        .await
        .unwrap_or(Err(TranscriptError::Timeout));

        match outcome {
            Ok(_) => false,
            Err(TranscriptError::Unavailable(message)) if is_premiere_message(&message) => true,
            Err(err) => {
                debug!(%video_id, error = %err, "transcript probe failed, not a premiere");
                false
            }
        }
    }
}

#[async_trait]
impl VideoClassifier for ProbeClassifier {
    async fn classify(&self, video_id: &str) -> Classification {
        let short = self.probe_short(video_id).await;
        if short == ShortProbe::Short {
            info!(%video_id, "skipping short");
            return Classification::Short;
        }
        if self.probe_premiere(video_id).await {
            info!(%video_id, "skipping upcoming premiere");
            return Classification::Premiere;
        }
        match short {
            ShortProbe::Ambiguous => Classification::Unknown,
            _ => Classification::Normal,
        }
    }
}
