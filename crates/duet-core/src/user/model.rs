//! UserPreferences domain model.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Literal written into prompts for a preference the user left empty.
///
/// Earlier caches also stored this string on disk in place of a missing value,
/// so it is accepted as "absent" when deserializing.
pub const UNSET_TOKEN: &str = "None";

/// Conversational preferences used to build model B's system instruction.
///
/// The record is replaced as a whole on every edit; fields are never patched
/// individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// The user's profession
    #[serde(default, deserialize_with = "deserialize_optional_field")]
    pub profession: Option<String>,
    /// How the assistant should address the user
    #[serde(default, deserialize_with = "deserialize_optional_field")]
    pub preferred_title: Option<String>,
    /// Free-form description of the desired reply style
    #[serde(default, deserialize_with = "deserialize_optional_field")]
    pub reply_style: Option<String>,
    /// Anything else the assistant should know
    #[serde(default, deserialize_with = "deserialize_optional_field")]
    pub additional_info: Option<String>,
    /// When the record was last written
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp")]
    pub last_updated: DateTime<Utc>,
}

impl UserPreferences {
    /// Builds a fresh record from raw form input, stamping the current time.
    ///
    /// Blank answers become absent values.
    pub fn from_answers(
        profession: &str,
        preferred_title: &str,
        reply_style: &str,
        additional_info: &str,
    ) -> Self {
        Self {
            profession: normalize(profession),
            preferred_title: normalize(preferred_title),
            reply_style: normalize(reply_style),
            additional_info: normalize(additional_info),
            last_updated: Utc::now(),
        }
    }

    /// A record with every field unset.
    pub fn unset() -> Self {
        Self::from_answers("", "", "", "")
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::unset()
    }
}

fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == UNSET_TOKEN {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn deserialize_optional_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize))
}

/// Accepts RFC 3339 as well as the offset-less ISO timestamps older caches wrote.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_answers_become_absent() {
        let prefs = UserPreferences::from_answers("  engineer ", "", "   ", "likes tea");

        assert_eq!(prefs.profession.as_deref(), Some("engineer"));
        assert_eq!(prefs.preferred_title, None);
        assert_eq!(prefs.reply_style, None);
        assert_eq!(prefs.additional_info.as_deref(), Some("likes tea"));
    }

    #[test]
    fn test_legacy_sentinel_deserializes_as_absent() {
        let json = r#"{
            "profession": "None",
            "preferred_title": "Captain",
            "reply_style": "None",
            "additional_info": "None",
            "last_updated": "2025-06-28T10:00:00Z"
        }"#;

        let prefs: UserPreferences = serde_json::from_str(json).unwrap();

        assert_eq!(prefs.profession, None);
        assert_eq!(prefs.preferred_title.as_deref(), Some("Captain"));
        assert_eq!(prefs.reply_style, None);
    }

    #[test]
    fn test_legacy_naive_timestamp() {
        let json = r#"{ "profession": "nurse", "last_updated": "2025-06-28T10:15:30.123456" }"#;
        let prefs: UserPreferences = serde_json::from_str(json).unwrap();

        assert_eq!(prefs.profession.as_deref(), Some("nurse"));
        assert_eq!(prefs.preferred_title, None);
        assert_eq!(prefs.last_updated.to_rfc3339(), "2025-06-28T10:15:30.123456+00:00");
    }

    #[test]
    fn test_absent_fields_serialize_as_null() {
        let prefs = UserPreferences::unset();
        let value = serde_json::to_value(&prefs).unwrap();

        assert!(value["profession"].is_null());
        assert!(value["last_updated"].is_string());
    }
}
