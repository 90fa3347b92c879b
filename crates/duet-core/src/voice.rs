//! Voice selection and speech output.
//!
//! The registry, synthesizer and player are external collaborators; only their
//! interfaces live here.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A voice chosen from the remote registry, stored verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedVoice {
    /// Opaque identifier passed to the speech endpoint.
    pub uri: String,
    /// Human-readable name.
    #[serde(rename = "customName", default)]
    pub name: String,
    /// Transcript of the uploaded sample.
    #[serde(rename = "text", default)]
    pub sample_text: String,
    /// Speech model the voice belongs to, when the registry reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SelectedVoice {
    /// Name shown in menus, falling back to "Unknown".
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    /// The first `max_chars` characters of the sample transcript.
    pub fn sample_preview(&self, max_chars: usize) -> String {
        if self.sample_text.is_empty() {
            return "No description".to_string();
        }
        self.sample_text.chars().take(max_chars).collect()
    }
}

/// Lists the voices available to the current credential.
#[async_trait::async_trait]
pub trait VoiceRegistry: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<SelectedVoice>>;
}

/// Turns text into an audio file.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` with the voice identified by `voice_uri` and writes the
    /// audio to `output`.
    async fn synthesize(&self, text: &str, voice_uri: &str, output: &Path) -> Result<()>;
}

/// Plays an audio file through the operating system.
pub trait AudioPlayer: Send + Sync {
    fn play(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_wire_names() {
        let json = r#"{
            "model": "FunAudioLLM/CosyVoice2-0.5B",
            "customName": "narrator",
            "text": "A short sample sentence.",
            "uri": "speech:narrator:abc:def"
        }"#;

        let voice: SelectedVoice = serde_json::from_str(json).unwrap();

        assert_eq!(voice.uri, "speech:narrator:abc:def");
        assert_eq!(voice.display_name(), "narrator");
        assert_eq!(voice.model.as_deref(), Some("FunAudioLLM/CosyVoice2-0.5B"));
        assert_eq!(voice.sample_preview(7), "A short");
    }

    #[test]
    fn test_missing_name_and_sample() {
        let voice: SelectedVoice = serde_json::from_str(r#"{"uri": "speech:x"}"#).unwrap();

        assert_eq!(voice.display_name(), "Unknown");
        assert_eq!(voice.sample_preview(50), "No description");
    }
}
