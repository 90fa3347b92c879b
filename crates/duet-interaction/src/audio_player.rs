//! OS default audio player.

use duet_core::voice::AudioPlayer;
use duet_core::{DuetError, Result};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

/// Opens audio files with the platform's default application.
///
/// `play` returns as soon as the player is launched; a helper thread waits
/// for it so finished players are reaped.
#[derive(Debug, Clone, Default)]
pub struct SystemAudioPlayer;

impl SystemAudioPlayer {
    pub fn new() -> Self {
        Self
    }

    fn command(path: &Path) -> Command {
        if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.arg("/C").arg("start").arg("").arg(path);
            command
        } else if cfg!(target_os = "macos") {
            let mut command = Command::new("open");
            command.arg(path);
            command
        } else {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        }
    }
}

impl AudioPlayer for SystemAudioPlayer {
    fn play(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(DuetError::Playback(format!(
                "Audio file not found: {}",
                path.display()
            )));
        }

        tracing::info!("[Audio] Playing {}", path.display());
        let child = Self::command(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| DuetError::Playback(format!("Failed to launch player: {err}")))?;

        if let Err(e) = reap_in_background(child) {
            tracing::warn!("[Audio] Could not start the player reaper: {}", e);
        }
        Ok(())
    }
}

/// Waits for `child` on its own thread and logs an unsuccessful exit.
fn reap_in_background(mut child: Child) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    thread::Builder::new()
        .name("audio-player-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) => {
                if !status.success() {
                    tracing::warn!("[Audio] Player exited with {}", status);
                }
                Some(status)
            }
            Err(e) => {
                tracing::warn!("[Audio] Waiting for the player failed: {}", e);
                None
            }
        })
}
