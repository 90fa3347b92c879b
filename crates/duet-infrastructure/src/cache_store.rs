//! JSON-file implementation of [`PreferenceStore`].
//!
//! The file is a single JSON object keyed by machine fingerprint:
//!
//! ```json
//! {
//!   "3f2a…": {
//!     "api_keys": { "sf": "…", "ba": "…" },
//!     "preferences": { "profession": "…", "last_updated": "…" },
//!     "selected_voice": { "uri": "…", "customName": "…" }
//!   }
//! }
//! ```
//!
//! Entries for other fingerprints, and keys this version does not know, are
//! carried through every rewrite untouched. Sections are read one by one, so
//! a malformed voice does not cost the saved keys.

use crate::fingerprint::compute_fingerprint;
use crate::paths::DuetPaths;
use crate::storage::{AtomicJsonFile, OnCorrupt};
use duet_core::cache::{BundleUpdate, CacheBundle, PreferenceStore};
use duet_core::{DuetError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

type CacheDocument = BTreeMap<String, JsonValue>;

/// Preference cache stored as one JSON document.
pub struct JsonCacheStore {
    file: AtomicJsonFile<CacheDocument>,
    fingerprint: String,
}

impl JsonCacheStore {
    pub fn new(path: PathBuf, fingerprint: impl Into<String>) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
            fingerprint: fingerprint.into(),
        }
    }

    /// Opens the default cache file for the current machine.
    pub fn from_paths(paths: &DuetPaths) -> Result<Self> {
        let path = paths
            .cache_file()
            .map_err(|e| DuetError::config(e.to_string()))?;
        Ok(Self::new(path, compute_fingerprint()))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the bundle for this fingerprint.
    ///
    /// An unreadable file or a non-object entry is an error. A single
    /// malformed section is logged and read as absent.
    pub fn try_load(&self) -> Result<Option<CacheBundle>> {
        let Some(mut document) = self.file.load()? else {
            return Ok(None);
        };
        let Some(entry) = document.remove(&self.fingerprint) else {
            return Ok(None);
        };
        let JsonValue::Object(mut sections) = entry else {
            return Err(DuetError::cache_io(format!(
                "Cache entry for {} is not an object",
                self.fingerprint
            )));
        };

        Ok(Some(CacheBundle {
            api_keys: self.section(&mut sections, "api_keys"),
            preferences: self.section(&mut sections, "preferences"),
            selected_voice: self.section(&mut sections, "selected_voice"),
        }))
    }

    fn section<T: DeserializeOwned>(
        &self,
        sections: &mut Map<String, JsonValue>,
        key: &str,
    ) -> Option<T> {
        match sections.remove(key)? {
            JsonValue::Null => None,
            value => match serde_json::from_value(value) {
                Ok(section) => Some(section),
                Err(e) => {
                    tracing::warn!(
                        "[Cache] Ignoring malformed '{}' section for {}: {}",
                        key,
                        self.fingerprint,
                        e
                    );
                    None
                }
            },
        }
    }

    /// Merges `update` into this fingerprint's entry and rewrites the file.
    ///
    /// An unparsable file is replaced rather than blocking the write.
    pub fn try_save(&self, update: &BundleUpdate) -> Result<()> {
        self.file
            .update(OnCorrupt::Replace, |document: &mut CacheDocument| {
                let mut entry = match document.remove(&self.fingerprint) {
                    Some(JsonValue::Object(map)) => map,
                    _ => Map::new(),
                };
                update.merge_into(&mut entry)?;
                document.insert(self.fingerprint.clone(), JsonValue::Object(entry));
                Ok::<(), DuetError>(())
            })
    }
}

impl PreferenceStore for JsonCacheStore {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn load(&self) -> Option<CacheBundle> {
        match self.try_load() {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::error!("[Cache] Failed to read {}: {}", self.path().display(), e);
                None
            }
        }
    }

    fn save(&self, update: BundleUpdate) -> bool {
        if update.is_empty() {
            return true;
        }
        match self.try_save(&update) {
            Ok(()) => {
                tracing::debug!("[Cache] Saved entry for {}", self.fingerprint);
                true
            }
            Err(e) => {
                tracing::error!("[Cache] Failed to write {}: {}", self.path().display(), e);
                false
            }
        }
    }
}
