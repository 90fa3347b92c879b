//! Voice registry and voice sample upload.

use crate::http::{endpoint_url, ensure_success, map_send_error};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use duet_core::voice::{SelectedVoice, VoiceRegistry};
use duet_core::{DuetError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SERVICE: &str = "voice";

/// Lists custom voices via `GET {base_url}/audio/voice/list`.
#[derive(Clone)]
pub struct SiliconFlowVoiceRegistry {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SiliconFlowVoiceRegistry {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Deserialize)]
struct VoiceListResponse {
    #[serde(default)]
    result: Vec<SelectedVoice>,
}

#[async_trait]
impl VoiceRegistry for SiliconFlowVoiceRegistry {
    async fn list_voices(&self) -> Result<Vec<SelectedVoice>> {
        let url = endpoint_url(&self.base_url, "audio/voice/list");
        tracing::debug!("[Voice] GET {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| map_send_error(SERVICE, err))?;
        let response = ensure_success(SERVICE, response).await?;

        let parsed: VoiceListResponse = response.json().await.map_err(|err| {
            DuetError::remote(SERVICE, format!("Failed to parse voice list: {err}"))
        })?;

        tracing::info!("[Voice] Registry returned {} voices", parsed.result.len());
        Ok(parsed.result)
    }
}

/// A voice sample ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceUpload {
    pub model: String,
    #[serde(rename = "customName")]
    pub custom_name: String,
    /// `data:<mime>;base64,<payload>`
    pub audio: String,
    /// Transcript of the sample.
    pub text: String,
}

impl VoiceUpload {
    /// Reads an audio file and encodes it as a data URL.
    pub async fn from_file(
        path: &Path,
        model: impl Into<String>,
        custom_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            model: model.into(),
            custom_name: custom_name.into(),
            audio: audio_data_url(path, &bytes),
            text: text.into(),
        })
    }
}

/// MIME type for an audio file, judged by extension.
pub fn audio_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "audio/mpeg",
    }
}

fn audio_data_url(path: &Path, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        audio_mime_type(path),
        BASE64_STANDARD.encode(bytes)
    )
}

/// Uploads voice samples via `POST {base_url}/uploads/audio/voice`.
#[derive(Clone)]
pub struct VoiceUploader {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VoiceUploader {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Uploads the sample and returns the raw JSON response (it carries the new
    /// voice's `uri`).
    pub async fn upload(&self, upload: &VoiceUpload) -> Result<serde_json::Value> {
        let url = endpoint_url(&self.base_url, "uploads/audio/voice");
        tracing::info!(
            "[Voice] Uploading sample '{}' ({} base64 chars)",
            upload.custom_name,
            upload.audio.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(upload)
            .send()
            .await
            .map_err(|err| map_send_error(SERVICE, err))?;
        let response = ensure_success(SERVICE, response).await?;

        response.json().await.map_err(|err| {
            DuetError::remote(SERVICE, format!("Failed to parse upload response: {err}"))
        })
    }
}
