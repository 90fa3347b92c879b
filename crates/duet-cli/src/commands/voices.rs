use super::utils::speech_credentials;
use anyhow::Result;
use duet_application::AppContext;
use duet_core::voice::VoiceRegistry;

pub async fn run(context: &AppContext, api_key: &str) -> Result<()> {
    let registry = context.voice_registry(&speech_credentials(api_key));
    let voices = registry.list_voices().await?;

    if voices.is_empty() {
        println!("No custom voices found.");
        return Ok(());
    }

    let current = context.profiles().voice().map(|v| v.uri);
    for (number, voice) in voices.iter().enumerate() {
        let marker = if current.as_deref() == Some(voice.uri.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker}{}. {} - {}",
            number + 1,
            voice.display_name(),
            voice.sample_preview(50)
        );
        println!("     uri: {}", voice.uri);
    }
    Ok(())
}
