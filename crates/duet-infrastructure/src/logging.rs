//! Tracing setup shared by every duet binary.
//!
//! Everything at DEBUG and above goes to a daily-rotated file under the logs
//! directory. A console layer on stderr is optional; full-screen front-ends
//! turn it off so log lines never tear the UI.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "duet.log";
const NOISY_CRATES: &str = ",hyper=warn,reqwest=warn,rustyline=warn";

/// Keeps the background log writer alive. Drop it last.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber.
///
/// `console_level` is an `EnvFilter` directive such as `"info"`; `RUST_LOG`
/// wins over it when set. Calling this twice is harmless: the second call
/// leaves the first subscriber in place.
pub fn init(logs_dir: Option<&Path>, console_level: Option<&str>) -> LoggingGuard {
    let (file_layer, file_guard) = match logs_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(LevelFilter::DEBUG);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Could not create log directory {}: {}", dir.display(), e);
                (None, None)
            }
        },
        None => (None, None),
    };

    let console_layer = console_level.map(|level| {
        let filter = match std::env::var("RUST_LOG") {
            Ok(directives) if !directives.trim().is_empty() => {
                EnvFilter::new(format!("{}{}", directives, NOISY_CRATES))
            }
            _ => EnvFilter::new(format!("{}{}", level, NOISY_CRATES)),
        };
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .ok();

    LoggingGuard {
        _file_guard: file_guard,
    }
}
