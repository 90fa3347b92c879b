//! Unified path management for duet files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/duet/              # Config directory (platform default)
//! ├── config.toml              # Deployment configuration
//! ├── user_cache.json          # Credentials, preferences, voice per fingerprint
//! ├── ai_reply.mp3             # Last synthesized reply
//! └── logs/                    # Application logs
//!     └── duet.log.YYYY-MM-DD
//! ```
//!
//! Passing a base directory relocates the whole tree, which is how tests and the
//! `--data-dir` flags keep everything in one place.

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "duet";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot determine the config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves every file duet reads or writes.
#[derive(Debug, Clone)]
pub struct DuetPaths {
    base: Option<PathBuf>,
}

impl DuetPaths {
    /// Creates a resolver rooted at `base`, or at the platform config directory.
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the root directory for all duet files.
    pub fn root_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    /// Returns the path to the deployment configuration file.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.root_dir()?.join("config.toml"))
    }

    /// Returns the path to the preference cache.
    ///
    /// # Security Note
    ///
    /// The cache holds API keys in plaintext.
    pub fn cache_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.root_dir()?.join("user_cache.json"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.root_dir()?.join("logs"))
    }

    /// Resolves a configured file name; relative names land in the root directory.
    pub fn resolve(&self, file: &Path) -> Result<PathBuf, PathError> {
        if file.is_absolute() {
            Ok(file.to_path_buf())
        } else {
            Ok(self.root_dir()?.join(file))
        }
    }
}

impl Default for DuetPaths {
    fn default() -> Self {
        Self::new(None)
    }
}
