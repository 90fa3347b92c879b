//! Deployment configuration loaded from `config.toml`.
//!
//! Every field has a default, so a missing file or a partial file both work.
//! API keys never live here; they come from the environment or the cache.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ANALYSIS_BASE_URL: &str = "https://api.siliconflow.cn/v1";
pub const DEFAULT_ANALYSIS_MODEL: &str = "deepseek-ai/DeepSeek-R1";
pub const DEFAULT_REPLY_BASE_URL: &str = "https://api2.aigcbest.top/v1";
pub const DEFAULT_REPLY_MODEL: &str = "gpt-4o";
pub const DEFAULT_SPEECH_MODEL: &str = "FunAudioLLM/CosyVoice2-0.5B";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Console log filter, e.g. `"info"` or `"duet=debug"`.
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub analysis: EndpointConfig,
    pub reply: EndpointConfig,
    pub speech: SpeechConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            request_timeout_secs: 120,
            analysis: EndpointConfig::new(DEFAULT_ANALYSIS_BASE_URL, DEFAULT_ANALYSIS_MODEL),
            reply: EndpointConfig::new(DEFAULT_REPLY_BASE_URL, DEFAULT_REPLY_MODEL),
            speech: SpeechConfig::default(),
        }
    }
}

/// An OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

/// Text-to-speech endpoint and output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub model: String,
    pub response_format: String,
    /// Relative paths resolve against the duet root directory.
    pub output_file: PathBuf,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ANALYSIS_BASE_URL.to_string(),
            model: DEFAULT_SPEECH_MODEL.to_string(),
            response_format: "mp3".to_string(),
            output_file: PathBuf::from("ai_reply.mp3"),
        }
    }
}

impl AppConfig {
    /// Loads the configuration. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, duet_core::DuetError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            duet_core::DuetError::config(format!("Invalid {}: {}", path.display(), e))
        })
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
