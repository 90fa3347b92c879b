//! `duet-tui`: full-screen front-end.
//!
//! Uses the API keys cached by `duet`, or asks for them on first start. All
//! remote work runs on a background [`ChatWorker`]; the UI thread only draws
//! and drains its events.

mod app;
mod ui;

use anyhow::Result;
use clap::Parser;
use duet_application::{AppContext, ChatWorker, WorkerEvents};
use duet_core::secret::ApiCredentials;
use duet_core::user::UserPreferences;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "duet-tui", version, about = "Full-screen duet chat")]
struct Args {
    /// Keep config, cache, logs and audio under this directory.
    #[arg(long, env = "DUET_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let (context, _guard) = AppContext::bootstrap(args.data_dir.as_deref(), false)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let profiles = context.profiles().clone();
    let handle = runtime.handle().clone();
    let connector = Box::new(
        move |credentials: &ApiCredentials| -> Result<(ChatWorker, WorkerEvents)> {
            let profiles = context.profiles();
            let preferences = profiles.preferences().unwrap_or_else(|| {
                tracing::info!("[Tui] No cached preferences, using unset ones");
                UserPreferences::unset()
            });
            let session = context.chat_session(credentials, preferences);
            let services = context.worker_services(credentials, profiles.voice(), false)?;
            Ok(ChatWorker::spawn(session, services, &handle))
        },
    );

    tracing::info!("duet-tui starting");
    let mut app = app::TuiApp::new(profiles, connector);
    let result = ui::run(&mut app);

    // Stop the worker before the runtime goes away.
    drop(app);
    runtime.shutdown_timeout(std::time::Duration::from_secs(1));
    tracing::info!("duet-tui exiting");
    result
}
