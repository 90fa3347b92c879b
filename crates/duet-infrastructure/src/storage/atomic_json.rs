//! Whole-file JSON documents replaced atomically.
//!
//! Writes go to a hidden `.{name}.tmp` sibling that is synced and renamed over
//! the target, so readers see either the old document or the new one. There
//! is no cross-process lock: the last writer wins.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::{self, Write as IoWrite};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum AtomicJsonError {
    /// The file could not be read, written or renamed.
    Io { path: PathBuf, source: io::Error },
    /// The file exists but does not hold a valid document.
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The value could not be encoded.
    Encode(serde_json::Error),
}

impl AtomicJsonError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether rewriting the file from scratch would fix the problem.
    pub fn is_corrupt(&self) -> bool {
        match self {
            Self::Corrupt { .. } => true,
            Self::Io { source, .. } => source.kind() == io::ErrorKind::InvalidData,
            Self::Encode(_) => false,
        }
    }
}

impl std::fmt::Display for AtomicJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::Corrupt { path, source } => {
                write!(f, "{} is not valid JSON: {}", path.display(), source)
            }
            Self::Encode(e) => write!(f, "could not encode JSON: {}", e),
        }
    }
}

impl std::error::Error for AtomicJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { source, .. } | Self::Encode(source) => Some(source),
        }
    }
}

impl From<AtomicJsonError> for duet_core::DuetError {
    fn from(e: AtomicJsonError) -> Self {
        duet_core::DuetError::cache_io(e.to_string())
    }
}

/// How [`AtomicJsonFile::update`] treats an unparsable file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnCorrupt {
    /// Return the error and leave the file alone.
    Fail,
    /// Start from `T::default()` and overwrite the file.
    Replace,
}

/// A JSON document on disk that is only ever replaced as a whole.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _document: PhantomData<fn() -> T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _document: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing or blank file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<T>, AtomicJsonError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AtomicJsonError::io(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| AtomicJsonError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Writes `data` as pretty JSON, creating parent directories as needed.
    pub fn save(&self, data: &T) -> Result<(), AtomicJsonError> {
        let json = serde_json::to_string_pretty(data).map_err(AtomicJsonError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AtomicJsonError::io(parent, e))?;
        }

        let tmp_path = self.temp_path();
        if let Err(e) = write_synced(&tmp_path, json.as_bytes()) {
            fs::remove_file(&tmp_path).ok();
            return Err(AtomicJsonError::io(&tmp_path, e));
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            fs::remove_file(&tmp_path).ok();
            AtomicJsonError::io(&self.path, e)
        })
    }

    /// Loads the document (default when missing), lets `edit` change it and
    /// writes it back. Nothing is written when `edit` fails.
    pub fn update<F, E>(&self, on_corrupt: OnCorrupt, edit: F) -> Result<(), E>
    where
        T: Default,
        F: FnOnce(&mut T) -> Result<(), E>,
        E: From<AtomicJsonError>,
    {
        let mut document = match self.load() {
            Ok(document) => document.unwrap_or_default(),
            Err(e) if on_corrupt == OnCorrupt::Replace && e.is_corrupt() => {
                tracing::warn!("[Storage] Replacing unreadable document: {}", e);
                T::default()
            }
            Err(e) => return Err(e.into()),
        };

        edit(&mut document)?;
        self.save(&document)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
