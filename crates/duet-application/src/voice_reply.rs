//! Spoken replies: synthesize, then play.

use duet_core::Result;
use duet_core::voice::{AudioPlayer, SelectedVoice, SpeechSynthesizer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shown when a reply could not be voiced. The text reply is already visible.
pub const SPEECH_FAILURE_MESSAGE: &str = "Speech generation failed, showing the text reply only.";

/// Turns model B replies into audio and plays them.
///
/// Clones share one output file and speak one reply at a time.
#[derive(Clone)]
pub struct VoiceReplyService {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Arc<dyn AudioPlayer>,
    output: PathBuf,
    output_lock: Arc<Mutex<()>>,
}

impl VoiceReplyService {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Arc<dyn AudioPlayer>,
        output: PathBuf,
    ) -> Self {
        Self {
            synthesizer,
            player,
            output,
            output_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Synthesizes `text` with `voice` and starts playback.
    ///
    /// Waits for any earlier reply to finish writing and start playing first.
    /// Errors are logged here; callers only need to tell the user.
    pub async fn speak(&self, text: &str, voice: &SelectedVoice) -> Result<PathBuf> {
        let _output = self.output_lock.lock().await;
        if let Err(e) = self
            .synthesizer
            .synthesize(text, &voice.uri, &self.output)
            .await
        {
            tracing::error!("[Speech] Synthesis with '{}' failed: {}", voice.display_name(), e);
            return Err(e);
        }

        if let Err(e) = self.player.play(&self.output) {
            tracing::error!("[Speech] Playback failed: {}", e);
            return Err(e);
        }

        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use duet_core::DuetError;
    use std::sync::Mutex;

    struct FakeSynthesizer {
        fail: bool,
        requests: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(&self, text: &str, voice_uri: &str, _output: &Path) -> Result<()> {
            self.requests
                .lock()
                .unwrap()
                .push((text.to_string(), voice_uri.to_string()));
            if self.fail {
                Err(DuetError::remote("speech", "quota exceeded"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct RecordingPlayer {
        played: Mutex<Vec<PathBuf>>,
    }

    impl AudioPlayer for RecordingPlayer {
        fn play(&self, path: &Path) -> Result<()> {
            self.played.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn voice() -> SelectedVoice {
        SelectedVoice {
            uri: "speech:v:1".to_string(),
            name: "v".to_string(),
            sample_text: String::new(),
            model: None,
        }
    }

    #[tokio::test]
    async fn test_speak_synthesizes_then_plays() {
        let synthesizer = Arc::new(FakeSynthesizer {
            fail: false,
            requests: Mutex::new(Vec::new()),
        });
        let player = Arc::new(RecordingPlayer::default());
        let service =
            VoiceReplyService::new(synthesizer.clone(), player.clone(), PathBuf::from("out.mp3"));

        let path = service.speak("hello", &voice()).await.unwrap();

        assert_eq!(path, PathBuf::from("out.mp3"));
        assert_eq!(
            synthesizer.requests.lock().unwrap()[0],
            ("hello".to_string(), "speech:v:1".to_string())
        );
        assert_eq!(player.played.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_synthesis_skips_playback() {
        let synthesizer = Arc::new(FakeSynthesizer {
            fail: true,
            requests: Mutex::new(Vec::new()),
        });
        let player = Arc::new(RecordingPlayer::default());
        let service = VoiceReplyService::new(synthesizer, player.clone(), PathBuf::from("out.mp3"));

        assert!(service.speak("hello", &voice()).await.is_err());
        assert!(player.played.lock().unwrap().is_empty());
    }
}
