use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub channels: Vec<String>,
    pub storage: StorageConfig,
    pub polling: PollingConfig,
    pub endpoints: Endpoints,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub check_interval_minutes: u64,
    pub request_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
}

/// Upstream locations. Tests point these at a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub feed_url: String,
    pub shorts_base: String,
    pub watch_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_transcript_chars: usize,
    pub transcript_languages: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            channels: vec![
                "https://www.youtube.com/@LennysPodcast".into(),
                "https://www.youtube.com/@googleantigravity".into(),
                "https://www.youtube.com/@Google/videos".into(),
                "https://www.youtube.com/@ycombinator".into(),
                "https://www.youtube.com/@a16z".into(),
                "https://www.youtube.com/@aiDotEngineer".into(),
            ],
            storage: StorageConfig::default(),
            polling: PollingConfig::default(),
            endpoints: Endpoints::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let mut dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("tube-monitor");
        Self { data_dir: dir }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: 240,
            request_timeout_seconds: 10,
            probe_timeout_seconds: 5,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            feed_url: "https://www.youtube.com/feeds/videos.xml".into(),
            shorts_base: "https://www.youtube.com/shorts/".into(),
            watch_url: "https://www.youtube.com/watch".into(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: "gpt-4o".into(),
            temperature: 0.7,
            timeout_seconds: 300,
            max_transcript_chars: 100_000,
            transcript_languages: vec!["zh-TW".into(), "zh".into(), "en".into()],
        }
    }
}

impl PollingConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Both the endpoint and the key are set and non-empty.
    pub fn is_configured(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.base_url) && set(&self.api_key)
    }
}

impl MonitorConfig {
    /// `<config dir>/tube-monitor/config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        dir.push("tube-monitor");
        Ok(dir.join("config.json"))
    }

    /// Reads and validates the configuration file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: MonitorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file, or falls back to defaults and tries to write them out.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "using default configuration");
                let config = Self::default();
                if !path.exists() {
                    if let Err(save_err) = config.save(path) {
                        warn!(error = %save_err, "failed to write default configuration");
                    }
                }
                config
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// `LLM_API_KEY`, `LLM_BASE_URL` and `LLM_MODEL` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(base) = std::env::var("LLM_BASE_URL") {
            self.llm.base_url = Some(base);
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.iter().all(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("channels must list at least one url"));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("storage.data_dir must be non-empty"));
        }
        if self.polling.check_interval_minutes == 0 {
            return Err(ConfigError::Invalid(
                "polling.check_interval_minutes must be > 0",
            ));
        }
        if self.polling.request_timeout_seconds == 0 || self.polling.probe_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("polling timeouts must be > 0"));
        }
        if self.llm.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("llm.timeout_seconds must be > 0"));
        }
        if self.llm.max_transcript_chars == 0 {
            return Err(ConfigError::Invalid("llm.max_transcript_chars must be > 0"));
        }
        Ok(())
    }
}
