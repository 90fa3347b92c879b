//! Reading and writing the current user's cached profile.

use duet_core::cache::{BundleUpdate, CacheBundle, PreferenceStore};
use duet_core::secret::ApiCredentials;
use duet_core::user::UserPreferences;
use duet_core::voice::SelectedVoice;
use std::sync::Arc;

/// Environment variable holding the model A (analysis) key.
pub const ENV_ANALYSIS_API_KEY: &str = "DUET_ANALYSIS_API_KEY";
/// Environment variable holding the model B (reply) key.
pub const ENV_REPLY_API_KEY: &str = "DUET_REPLY_API_KEY";

/// The four preference questions, in the order they are asked.
pub const PREFERENCE_QUESTIONS: [&str; 4] = [
    "Your profession",
    "How would you like to be addressed",
    "Preferred reply style (e.g. concise, detailed, humorous)",
    "Anything else you would like the assistant to know",
];

/// Credential, preference and voice access for the current fingerprint.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn PreferenceStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn fingerprint(&self) -> &str {
        self.store.fingerprint()
    }

    /// Everything cached for this machine, or an empty bundle.
    pub fn cached(&self) -> CacheBundle {
        self.store.load().unwrap_or_default()
    }

    /// Cached credentials, only when both keys are present.
    pub fn credentials(&self) -> Option<ApiCredentials> {
        self.cached().api_keys.filter(ApiCredentials::is_complete)
    }

    pub fn preferences(&self) -> Option<UserPreferences> {
        self.cached().preferences
    }

    pub fn voice(&self) -> Option<SelectedVoice> {
        self.cached().selected_voice
    }

    pub fn save_credentials(&self, credentials: ApiCredentials) -> bool {
        self.store.save(BundleUpdate::api_keys(credentials))
    }

    pub fn save_preferences(&self, preferences: UserPreferences) -> bool {
        self.store.save(BundleUpdate::preferences(preferences))
    }

    pub fn save_voice(&self, voice: SelectedVoice) -> bool {
        tracing::info!("[Profile] Selected voice '{}'", voice.display_name());
        self.store.save(BundleUpdate::selected_voice(voice))
    }
}

/// Keys found in the environment, each independently optional.
pub fn env_api_keys() -> (Option<String>, Option<String>) {
    (read_env(ENV_ANALYSIS_API_KEY), read_env(ENV_REPLY_API_KEY))
}

/// Credentials from the environment when both variables are set.
pub fn credentials_from_env() -> Option<ApiCredentials> {
    match env_api_keys() {
        (Some(analysis), Some(reply)) => Some(ApiCredentials::new(analysis, reply)),
        _ => None,
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Builds preferences from answers to [`PREFERENCE_QUESTIONS`].
pub fn preferences_from_answers(answers: &[String; 4]) -> UserPreferences {
    UserPreferences::from_answers(&answers[0], &answers[1], &answers[2], &answers[3])
}
