use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{redirect, Client, ClientBuilder};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tube_core::{
    extract_video_id, lookup_video, spawn_scheduler, ChatSummarizer, DataApi, Ingestor,
    MonitorConfig, NoopSummarizer, PassGuard, ProbeClassifier, SchedulerConfig, Summarizer,
    YoutubeFeeds, YoutubeTranscripts,
};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the JSON config file (defaults to the per-user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check channels on a schedule until Ctrl-C
    Run {
        /// Check once right away instead of waiting for the first interval
        #[arg(long)]
        now: bool,
    },
    /// Check every channel once and exit
    Check,
    /// Summarize and record a single video by URL or id
    Add { video: String },
    /// Delete recorded videos and rewind cursors that pointed at them
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Forget the last seen video of a channel so it is re-discovered
    ResetCursor { channel_url: String },
    /// Reorder the video collection by publication date
    Sort,
    /// Print the recorded videos
    List,
    /// Flip the read flag of a recorded video
    ToggleRead { id: String },
    /// Delete all videos, cursors, summaries and the discovery log
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let args = Args::parse();
    let config = load_config(args.config)?;
    let data = DataApi::open(&config.storage.data_dir).await;

    match args.command.unwrap_or(Command::Run { now: false }) {
        Command::Run { now } => {
            let ingestor = Arc::new(build_ingestor(&config, data)?);
            let handle = spawn_scheduler(
                ingestor,
                SchedulerConfig {
                    interval: config.polling.check_interval(),
                    run_on_start: now,
                },
            );
            info!(
                interval_minutes = config.polling.check_interval_minutes,
                "scheduler started"
            );
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            handle.stop().await?;
            info!("scheduler stopped");
        }
        Command::Check => {
            let ingestor = build_ingestor(&config, data)?;
            let count = PassGuard::new().run_exclusive(&ingestor).await.unwrap_or(0);
            println!("{count} new video(s)");
        }
        Command::Add { video } => {
            let Some(video_id) = extract_video_id(&video) else {
                bail!("not a video id or url: {video}");
            };
            let client = http_client(&config)?;
            let record = lookup_video(&client, &config.endpoints.watch_url, &video_id).await;
            let ingestor = build_ingestor(&config, data)?;
            if ingestor.add_video(record.clone()).await? {
                println!("added: {} ({})", record.title, record.channel_title);
            } else {
                println!("already recorded: {video_id}");
            }
        }
        Command::Remove { ids } => {
            let removed = data.remove_videos(&ids).await?;
            println!("removed {removed} video(s)");
        }
        Command::ResetCursor { channel_url } => {
            if data.cursors().reset_channel(&channel_url).await? {
                println!("cursor reset for {channel_url}");
            } else {
                println!("no cursor stored for {channel_url}");
            }
        }
        Command::Sort => {
            let count = data.sort_by_published().await?;
            println!("sorted {count} video(s)");
        }
        Command::List => {
            for video in data.list_videos().await {
                println!(
                    "{} {} [{}] {} - {}{}",
                    if video.is_read { " " } else { "*" },
                    video.id,
                    video.channel_title,
                    video.title,
                    video.published,
                    if video.has_summary { " (summary)" } else { "" }
                );
            }
        }
        Command::ToggleRead { id } => {
            let video = data.toggle_read(&id).await?;
            println!("{} is_read={}", video.id, video.is_read);
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("reset deletes all recorded data; pass --yes to confirm");
            }
            data.reset().await?;
            println!("data directory cleared: {}", data.dir().display());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_config(path: Option<PathBuf>) -> Result<MonitorConfig> {
    let path = match path {
        Some(path) => path,
        None => MonitorConfig::default_path()?,
    };
    let mut config = MonitorConfig::load_or_default(&path);
    config.apply_env_overrides();
    Ok(config)
}

fn http_client(config: &MonitorConfig) -> Result<Client> {
    ClientBuilder::new()
        .redirect(redirect::Policy::limited(5))
        .user_agent("Mozilla/5.0 (compatible; tube-monitor/0.1)")
        .timeout(config.polling.request_timeout())
        .build()
        .context("failed to build HTTP client")
}

fn build_ingestor(config: &MonitorConfig, data: DataApi) -> Result<Ingestor> {
    let client = http_client(config)?;
    let transcript_client = ClientBuilder::new()
        .timeout(config.polling.request_timeout())
        .build()
        .context("failed to build transcript client")?;
    let transcripts = Arc::new(
        YoutubeTranscripts::new(transcript_client, config.llm.transcript_languages.clone())
            .context("failed to initialise transcript client")?,
    );
    let classifier = ProbeClassifier::new(
        config.endpoints.shorts_base.clone(),
        transcripts.clone(),
        config.polling.probe_timeout(),
    )
    .context("failed to build probe client")?;
    let summarizer: Arc<dyn Summarizer> = if config.llm.is_configured() {
        let llm_client = ClientBuilder::new()
            .timeout(config.llm.timeout())
            .build()
            .context("failed to build LLM client")?;
        Arc::new(ChatSummarizer::new(llm_client, config.llm.clone(), transcripts))
    } else {
        warn!("LLM_API_KEY or LLM_BASE_URL not set, videos are recorded without summaries");
        Arc::new(NoopSummarizer)
    };
    let feeds = YoutubeFeeds::new(client, config.endpoints.feed_url.clone());

    Ok(Ingestor::new(
        config.channels.clone(),
        Arc::new(feeds),
        Arc::new(classifier),
        summarizer,
        data,
    ))
}
