use anyhow::{Result, bail};
use duet_application::AppContext;
use duet_core::secret::ApiCredentials;

/// Picks the key from the command line/environment, then from the cache.
pub fn resolve_api_key(context: &AppContext, explicit: Option<String>) -> Result<String> {
    if let Some(key) = explicit.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    if let Some(cached) = context.profiles().cached().api_keys {
        if !cached.analysis_key.is_empty() {
            return Ok(cached.analysis_key);
        }
    }
    bail!("No API key. Pass --api-key, set DUET_ANALYSIS_API_KEY, or run `duet` once.")
}

/// Speech endpoints only use the analysis key.
pub fn speech_credentials(api_key: &str) -> ApiCredentials {
    ApiCredentials::new(api_key, "")
}
