//! Remote collaborators for duet.
//!
//! - `chat_api`: OpenAI-compatible chat completions, used for both models
//! - `voice_api`: voice registry listing and voice sample upload
//! - `speech_api`: text-to-speech synthesis into a local file
//! - `audio_player`: hands audio files to the OS default player

pub mod audio_player;
pub mod chat_api;
mod http;
pub mod speech_api;
pub mod voice_api;

pub use audio_player::SystemAudioPlayer;
pub use chat_api::OpenAiCompatibleChat;
pub use http::build_http_client;
pub use speech_api::SpeechClient;
pub use voice_api::{SiliconFlowVoiceRegistry, VoiceUpload, VoiceUploader};
