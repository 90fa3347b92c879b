use super::utils::speech_credentials;
use anyhow::{Result, bail};
use duet_application::AppContext;
use duet_core::voice::{AudioPlayer, SpeechSynthesizer};
use duet_interaction::SystemAudioPlayer;
use std::path::PathBuf;

pub async fn run(
    context: &AppContext,
    api_key: &str,
    text: &str,
    voice: Option<String>,
    output: Option<PathBuf>,
    play: bool,
) -> Result<()> {
    let Some(voice_uri) = voice.or_else(|| context.profiles().voice().map(|v| v.uri)) else {
        bail!("No voice given and none cached. Pass --voice <uri> or pick one in `duet`.");
    };
    let output = match output {
        Some(path) => path,
        None => context.speech_output_path()?,
    };

    context
        .speech_client(&speech_credentials(api_key))
        .synthesize(text, &voice_uri, &output)
        .await?;
    println!("Saved speech to {}", output.display());

    if play {
        SystemAudioPlayer::new().play(&output)?;
    }
    Ok(())
}
