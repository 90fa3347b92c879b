//! OpenAI-compatible chat-completion client.
//!
//! Both models speak the same wire protocol; only base URL, model id and
//! credential differ.

use crate::http::{endpoint_url, ensure_success, map_send_error};
use async_trait::async_trait;
use duet_core::conversation::{ChatBackend, ChatMessage};
use duet_core::{DuetError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const RESPONSE_PREVIEW_CHARS: usize = 200;

/// A [`ChatBackend`] talking to `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct OpenAiCompatibleChat {
    client: Client,
    name: String,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleChat {
    /// Creates a backend. `name` only shows up in logs and errors.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Replaces the HTTP client, e.g. with one carrying a timeout.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &ChatCompletionRequest<'_>) -> Result<String> {
        let url = endpoint_url(&self.base_url, "chat/completions");
        tracing::debug!(
            "[{}] POST {} model={} turns={} temperature={}",
            self.name,
            url,
            body.model,
            body.messages.len(),
            body.temperature
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| map_send_error(&self.name, err))?;

        let response = ensure_success(&self.name, response).await?;

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            DuetError::remote(&self.name, format!("Failed to parse response: {err}"))
        })?;

        self.extract_text_response(parsed)
    }

    fn extract_text_response(&self, response: ChatCompletionResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DuetError::remote(&self.name, "Response contained no content"))
    }
}

#[async_trait]
impl ChatBackend for OpenAiCompatibleChat {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        let started = Instant::now();
        let content = self.send_request(&request).await?;
        tracing::info!(
            "[{}] Completed in {:.2}s ({} chars)",
            self.name,
            started.elapsed().as_secs_f64(),
            content.chars().count()
        );
        tracing::debug!(
            "[{}] Response preview: {}",
            self.name,
            content.chars().take(RESPONSE_PREVIEW_CHARS).collect::<String>()
        );
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: 0.7,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_extract_first_choice() {
        let chat = OpenAiCompatibleChat::new("reply", "http://unused", "key", "m");
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "first"}},
                            {"message": {"role": "assistant", "content": "second"}}]}"#,
        )
        .unwrap();

        assert_eq!(chat.extract_text_response(response).unwrap(), "first");
    }

    #[test]
    fn test_extract_without_content() {
        let chat = OpenAiCompatibleChat::new("reply", "http://unused", "key", "m");
        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();

        let err = chat.extract_text_response(response).unwrap_err();
        assert!(err.is_remote());
    }
}
