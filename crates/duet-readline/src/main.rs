//! `duet`: terminal front-end.
//!
//! Asks for API keys and preferences (reusing cached ones on request), then
//! offers text chat, voice chat, voice selection and preference updates from a
//! numbered menu.

mod app;
mod helper;
mod menu;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use duet_application::AppContext;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "duet", version, about = "Two-model analysis and reply chat")]
struct Args {
    /// Keep config, cache, logs and audio under this directory.
    #[arg(long, env = "DUET_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (context, _guard) = AppContext::bootstrap(args.data_dir.as_deref(), true)?;
    tracing::info!("duet starting");

    println!("{}", "=== duet ===".bright_magenta().bold());

    let Some(mut app) = app::TerminalApp::onboard(context)? else {
        println!("{}", "Setup cancelled, goodbye!".bright_green());
        return Ok(());
    };
    app.run().await?;

    tracing::info!("duet exiting");
    Ok(())
}
