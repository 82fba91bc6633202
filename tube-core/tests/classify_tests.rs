use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tube_core::{
    Classification, ProbeClassifier, ShortProbe, TranscriptError, TranscriptSource,
    VideoClassifier,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

enum Transcript {
    Available,
    Premiere,
    NoCaptions,
    Hangs,
}

#[async_trait]
impl TranscriptSource for Transcript {
    async fn fetch_transcript(&self, _video_id: &str) -> Result<String, TranscriptError> {
        match self {
            Transcript::Available => Ok("hello world".into()),
            Transcript::Premiere => Err(TranscriptError::Unavailable(
                "This live event will begin in a few moments. Premieres in 3 hours".into(),
            )),
            Transcript::NoCaptions => Err(TranscriptError::Unavailable(
                "Subtitles are disabled for this video".into(),
            )),
            Transcript::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }
    }
}

async fn mount_head(server: &MockServer, video_id: &str, status: u16) {
    let mut response = ResponseTemplate::new(status);
    if (300..400).contains(&status) {
        response = response.insert_header(
            "location",
            format!("https://www.youtube.com/watch?v={video_id}").as_str(),
        );
    }
    Mock::given(method("HEAD"))
        .and(path(format!("/shorts/{video_id}")))
        .respond_with(response)
        .mount(server)
        .await;
}

fn classifier(server: &MockServer, transcript: Transcript) -> ProbeClassifier {
    ProbeClassifier::new(
        format!("{}/shorts/", server.uri()),
        Arc::new(transcript),
        Duration::from_millis(500),
    )
    .unwrap()
}

#[tokio::test]
async fn shorts_endpoint_answering_directly_means_short() {
    let server = MockServer::start().await;
    mount_head(&server, "shortvid001", 200).await;

    let c = classifier(&server, Transcript::Available);
    assert_eq!(c.probe_short("shortvid001").await, ShortProbe::Short);
    assert_eq!(c.classify("shortvid001").await, Classification::Short);
}

#[tokio::test]
async fn redirect_away_from_shorts_means_normal() {
    let server = MockServer::start().await;
    mount_head(&server, "normalvid01", 303).await;

    let c = classifier(&server, Transcript::Available);
    assert_eq!(c.probe_short("normalvid01").await, ShortProbe::NotShort);
    assert_eq!(c.classify("normalvid01").await, Classification::Normal);
}

#[tokio::test]
async fn other_statuses_are_ambiguous_and_processed_as_unknown() {
    let server = MockServer::start().await;
    mount_head(&server, "weirdvid001", 404).await;

    let c = classifier(&server, Transcript::Available);
    assert_eq!(c.probe_short("weirdvid001").await, ShortProbe::Ambiguous);
    let classification = c.classify("weirdvid001").await;
    assert_eq!(classification, Classification::Unknown);
    assert!(classification.is_ingestible());
}

#[tokio::test]
async fn unreachable_shorts_endpoint_is_ambiguous() {
    let c = ProbeClassifier::new(
        "http://127.0.0.1:9/shorts/",
        Arc::new(Transcript::Available),
        Duration::from_millis(500),
    )
    .unwrap();
    assert_eq!(c.probe_short("anyvideo001").await, ShortProbe::Ambiguous);
}

#[tokio::test]
async fn premiere_message_marks_upcoming_premiere() {
    let server = MockServer::start().await;
    mount_head(&server, "premiere001", 303).await;

    let c = classifier(&server, Transcript::Premiere);
    assert!(c.probe_premiere("premiere001").await);
    assert_eq!(c.classify("premiere001").await, Classification::Premiere);
}

#[tokio::test]
async fn missing_captions_are_not_a_premiere() {
    let server = MockServer::start().await;
    mount_head(&server, "nocaption01", 303).await;

    let c = classifier(&server, Transcript::NoCaptions);
    assert!(!c.probe_premiere("nocaption01").await);
    assert_eq!(c.classify("nocaption01").await, Classification::Normal);
}

#[tokio::test]
async fn slow_transcript_probe_times_out_as_not_premiere() {
    let server = MockServer::start().await;
    mount_head(&server, "slowvideo01", 303).await;

    let c = classifier(&server, Transcript::Hangs);
    assert_eq!(c.classify("slowvideo01").await, Classification::Normal);
}
