//! Composition root shared by every binary.

use crate::onboarding::ProfileService;
use crate::router::ConversationRouter;
use crate::session::ChatSession;
use crate::voice_reply::VoiceReplyService;
use crate::worker::WorkerServices;
use duet_core::cache::PreferenceStore;
use duet_core::secret::ApiCredentials;
use duet_core::user::UserPreferences;
use duet_core::voice::{SelectedVoice, VoiceRegistry};
use duet_core::{DuetError, Result};
use duet_infrastructure::logging::{self, LoggingGuard};
use duet_infrastructure::{AppConfig, DuetPaths, JsonCacheStore};
use duet_interaction::{
    OpenAiCompatibleChat, SiliconFlowVoiceRegistry, SpeechClient, SystemAudioPlayer,
    VoiceUploader, build_http_client,
};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Paths, configuration, cache and HTTP client for one process.
pub struct AppContext {
    paths: DuetPaths,
    config: AppConfig,
    profiles: ProfileService,
    http: Client,
}

impl AppContext {
    pub fn new(paths: DuetPaths, config: AppConfig) -> Result<Self> {
        let store = JsonCacheStore::from_paths(&paths)?;
        tracing::debug!(
            "[Context] Cache file {} (fingerprint {})",
            store.path().display(),
            store.fingerprint()
        );
        let http = build_http_client(config.request_timeout())?;
        Ok(Self {
            paths,
            config,
            profiles: ProfileService::new(Arc::new(store)),
            http,
        })
    }

    /// Loads configuration, installs logging, then builds the context.
    ///
    /// `console` turns the stderr log layer on; full-screen front-ends pass
    /// `false`. The returned guard must outlive every log call.
    pub fn bootstrap(data_dir: Option<&Path>, console: bool) -> Result<(Self, LoggingGuard)> {
        let paths = DuetPaths::new(data_dir);
        let loaded = paths
            .config_file()
            .map_err(|e| DuetError::config(e.to_string()))
            .and_then(|file| AppConfig::load(&file));
        let config = loaded.clone().unwrap_or_default();

        let logs_dir = paths.logs_dir().ok();
        let guard = logging::init(
            logs_dir.as_deref(),
            console.then_some(config.log_level.as_str()),
        );
        if let Err(e) = loaded {
            tracing::warn!("[Context] {}; using default configuration", e);
        }

        let context = Self::new(paths, config)?;
        Ok((context, guard))
    }

    pub fn paths(&self) -> &DuetPaths {
        &self.paths
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn router(&self, credentials: &ApiCredentials) -> ConversationRouter {
        let analysis = OpenAiCompatibleChat::new(
            "analysis",
            &self.config.analysis.base_url,
            &credentials.analysis_key,
            &self.config.analysis.model,
        )
        .with_client(self.http.clone());
        let reply = OpenAiCompatibleChat::new(
            "reply",
            &self.config.reply.base_url,
            &credentials.reply_key,
            &self.config.reply.model,
        )
        .with_client(self.http.clone());

        ConversationRouter::new(Arc::new(analysis), Arc::new(reply))
    }

    pub fn chat_session(
        &self,
        credentials: &ApiCredentials,
        preferences: UserPreferences,
    ) -> ChatSession {
        ChatSession::new(self.router(credentials), preferences)
    }

    /// Speech and the voice registry use the analysis credential.
    pub fn voice_registry(&self, credentials: &ApiCredentials) -> Arc<dyn VoiceRegistry> {
        Arc::new(
            SiliconFlowVoiceRegistry::new(&self.config.speech.base_url, &credentials.analysis_key)
                .with_client(self.http.clone()),
        )
    }

    pub fn speech_client(&self, credentials: &ApiCredentials) -> SpeechClient {
        SpeechClient::new(
            &self.config.speech.base_url,
            &credentials.analysis_key,
            &self.config.speech.model,
        )
        .with_response_format(&self.config.speech.response_format)
        .with_client(self.http.clone())
    }

    pub fn voice_uploader(&self, credentials: &ApiCredentials) -> VoiceUploader {
        VoiceUploader::new(&self.config.speech.base_url, &credentials.analysis_key)
            .with_client(self.http.clone())
    }

    /// Where synthesized replies are written.
    pub fn speech_output_path(&self) -> Result<PathBuf> {
        self.paths
            .resolve(&self.config.speech.output_file)
            .map_err(|e| DuetError::config(e.to_string()))
    }

    pub fn voice_reply_service(&self, credentials: &ApiCredentials) -> Result<VoiceReplyService> {
        Ok(VoiceReplyService::new(
            Arc::new(self.speech_client(credentials)),
            Arc::new(SystemAudioPlayer::new()),
            self.speech_output_path()?,
        ))
    }

    pub fn worker_services(
        &self,
        credentials: &ApiCredentials,
        voice: Option<SelectedVoice>,
        speech_enabled: bool,
    ) -> Result<WorkerServices> {
        Ok(WorkerServices {
            speech: Some(self.voice_reply_service(credentials)?),
            registry: Some(self.voice_registry(credentials)),
            voice,
            speech_enabled,
        })
    }
}
