//! Error types for duet.

use thiserror::Error;

/// Text shown to the user whenever a remote call fails.
pub const REMOTE_FAILURE_MESSAGE: &str =
    "Sorry, a problem occurred while processing your request. Please try again later.";

/// Text shown to the user when a message is empty after its prefix is removed.
pub const EMPTY_INPUT_MESSAGE: &str =
    "Please enter some content (a prefix must be followed by actual text).";

/// A shared error type for the whole duet workspace.
///
/// The first three variants form the user-facing taxonomy: empty input is
/// recovered locally, remote failures surface as one generic message, and cache
/// failures are logged and otherwise ignored. None of them is fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DuetError {
    /// The message had no content after prefix stripping.
    #[error("Input is empty after removing the routing prefix")]
    EmptyInput,

    /// A chat, voice registry, speech or upload endpoint failed.
    #[error("Remote call to {service} failed: {message}")]
    RemoteCall {
        service: String,
        status: Option<u16>,
        message: String,
    },

    /// Reading or writing the local preference cache failed.
    #[error("Cache I/O error: {0}")]
    CacheIo(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Handing an audio file to the system player failed.
    #[error("Playback error: {0}")]
    Playback(String),
}

impl DuetError {
    /// Creates a RemoteCall error without an HTTP status.
    pub fn remote(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            service: service.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Creates a RemoteCall error carrying the HTTP status code.
    pub fn remote_status(service: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            service: service.into(),
            status: Some(status),
            message: format!("status {status}: {}", message.into()),
        }
    }

    /// Creates a CacheIo error
    pub fn cache_io(message: impl Into<String>) -> Self {
        Self::CacheIo(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteCall { .. })
    }

    /// Returns the text a front-end should display for this error.
    ///
    /// Remote failures deliberately collapse into one generic sentence; the full
    /// detail only goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyInput => EMPTY_INPUT_MESSAGE.to_string(),
            Self::RemoteCall { .. } => REMOTE_FAILURE_MESSAGE.to_string(),
            Self::Playback(_) => "Audio playback failed.".to_string(),
            other => format!("An error occurred: {other}"),
        }
    }
}

impl From<std::io::Error> for DuetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for DuetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, DuetError>`.
pub type Result<T> = std::result::Result<T, DuetError>;
