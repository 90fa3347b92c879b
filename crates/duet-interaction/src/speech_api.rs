//! Text-to-speech synthesis.

use crate::http::{endpoint_url, ensure_success, map_send_error};
use async_trait::async_trait;
use duet_core::voice::SpeechSynthesizer;
use duet_core::{DuetError, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

const SERVICE: &str = "speech";

/// Synthesizes speech via `POST {base_url}/audio/speech`.
#[derive(Clone)]
pub struct SpeechClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    response_format: String,
}

impl SpeechClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            response_format: "mp3".to_string(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_response_format(mut self, format: impl Into<String>) -> Self {
        self.response_format = format.into();
        self
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str, voice_uri: &str, output: &Path) -> Result<()> {
        let url = endpoint_url(&self.base_url, "audio/speech");
        let request = SpeechRequest {
            model: &self.model,
            voice: voice_uri,
            input: text,
            response_format: &self.response_format,
        };
        tracing::info!("[Speech] Synthesizing {} chars", text.chars().count());
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| map_send_error(SERVICE, err))?;
        let mut response = ensure_success(SERVICE, response).await?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = tokio::fs::File::create(output).await?;
        let mut written = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| DuetError::remote(SERVICE, format!("Audio stream failed: {err}")))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        drop(file);

        if written == 0 {
            tokio::fs::remove_file(output).await.ok();
            return Err(DuetError::remote(SERVICE, "Speech endpoint returned no audio"));
        }

        tracing::info!(
            "[Speech] Wrote {} bytes to {} in {:.2}s",
            written,
            output.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
