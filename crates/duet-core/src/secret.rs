//! API credentials for the two chat providers.

use serde::{Deserialize, Serialize};

/// Bearer tokens for model A (analysis) and model B (reply).
///
/// The on-disk names `sf` and `ba` are kept so existing cache files keep loading.
///
/// # Security Note
///
/// Stored as plaintext JSON inside the preference cache. The `Debug` impl never
/// prints the keys.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    /// Credential for the analysis endpoint, also used for voice and speech calls.
    #[serde(rename = "sf")]
    pub analysis_key: String,
    /// Credential for the humanized-reply endpoint.
    #[serde(rename = "ba")]
    pub reply_key: String,
}

impl ApiCredentials {
    pub fn new(analysis_key: impl Into<String>, reply_key: impl Into<String>) -> Self {
        Self {
            analysis_key: analysis_key.into().trim().to_string(),
            reply_key: reply_key.into().trim().to_string(),
        }
    }

    /// Both keys are present.
    pub fn is_complete(&self) -> bool {
        !self.analysis_key.is_empty() && !self.reply_key.is_empty()
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("analysis_key", &mask(&self.analysis_key))
            .field("reply_key", &mask(&self.reply_key))
            .finish()
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    if key.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
