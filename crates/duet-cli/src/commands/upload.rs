use super::utils::speech_credentials;
use anyhow::{Context, Result};
use duet_application::AppContext;
use duet_interaction::VoiceUpload;
use std::path::Path;

pub async fn run(
    context: &AppContext,
    api_key: &str,
    file: &Path,
    name: &str,
    text: &str,
) -> Result<()> {
    let upload = VoiceUpload::from_file(file, &context.config().speech.model, name, text)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("Audio file read, uploading...");

    let response = context
        .voice_uploader(&speech_credentials(api_key))
        .upload(&upload)
        .await?;

    println!("Upload succeeded:");
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
