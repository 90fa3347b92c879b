//! Cache bundle and partial updates.

use crate::secret::ApiCredentials;
use crate::user::UserPreferences;
use crate::voice::SelectedVoice;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Everything cached for one fingerprint.
///
/// Each top-level field evolves independently: saving preferences never erases
/// credentials, and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<ApiCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_voice: Option<SelectedVoice>,
}

/// A set of top-level bundle keys to overwrite. Keys left `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleUpdate {
    pub api_keys: Option<ApiCredentials>,
    pub preferences: Option<UserPreferences>,
    pub selected_voice: Option<SelectedVoice>,
}

impl BundleUpdate {
    pub fn api_keys(credentials: ApiCredentials) -> Self {
        Self {
            api_keys: Some(credentials),
            ..Self::default()
        }
    }

    pub fn preferences(preferences: UserPreferences) -> Self {
        Self {
            preferences: Some(preferences),
            ..Self::default()
        }
    }

    pub fn selected_voice(voice: SelectedVoice) -> Self {
        Self {
            selected_voice: Some(voice),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_keys.is_none() && self.preferences.is_none() && self.selected_voice.is_none()
    }

    /// Merges this update into a raw bundle object, last write wins per key.
    ///
    /// Works on JSON so that keys this version does not know about survive the
    /// rewrite.
    pub fn merge_into(&self, bundle: &mut Map<String, JsonValue>) -> serde_json::Result<()> {
        if let Some(api_keys) = &self.api_keys {
            bundle.insert("api_keys".to_string(), serde_json::to_value(api_keys)?);
        }
        if let Some(preferences) = &self.preferences {
            bundle.insert("preferences".to_string(), serde_json::to_value(preferences)?);
        }
        if let Some(voice) = &self.selected_voice {
            bundle.insert("selected_voice".to_string(), serde_json::to_value(voice)?);
        }
        Ok(())
    }
}
