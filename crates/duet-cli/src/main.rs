use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "duet-dev")]
#[command(about = "duet developer tools - voice registry, speech and prompt helpers", long_about = None)]
struct Cli {
    /// Keep config, cache and logs under this directory.
    #[arg(long, global = true, env = "DUET_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Analysis/speech API key. Falls back to the cached key.
    #[arg(long, global = true, env = "DUET_ANALYSIS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the custom voices available to the API key
    Voices,
    /// Upload an audio sample as a new custom voice
    UploadVoice {
        /// Audio file (mp3, wav, m4a, aac, ogg, flac)
        file: PathBuf,
        /// Name for the new voice
        #[arg(long)]
        name: String,
        /// Transcript of the sample
        #[arg(long)]
        text: String,
    },
    /// Synthesize a phrase and play it
    Speak {
        text: String,
        /// Voice URI; defaults to the cached voice
        #[arg(long)]
        voice: Option<String>,
        /// Output file; defaults to the configured speech output
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write the file without playing it
        #[arg(long)]
        no_play: bool,
    },
    /// Join a multi-line prompt into one line with literal \n separators
    EscapeLines {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::EscapeLines { file } = &cli.command {
        return commands::escape::run(file.as_deref());
    }

    let (context, _guard) = duet_application::AppContext::bootstrap(cli.data_dir.as_deref(), true)?;
    let api_key = commands::utils::resolve_api_key(&context, cli.api_key)?;

    match cli.command {
        Commands::Voices => commands::voices::run(&context, &api_key).await?,
        Commands::UploadVoice { file, name, text } => {
            commands::upload::run(&context, &api_key, &file, &name, &text).await?
        }
        Commands::Speak {
            text,
            voice,
            output,
            no_play,
        } => commands::speak::run(&context, &api_key, &text, voice, output, !no_play).await?,
        Commands::EscapeLines { .. } => {}
    }

    Ok(())
}
