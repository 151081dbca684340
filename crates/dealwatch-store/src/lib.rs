//! File-backed state store: one JSON document per target key.
//!
//! `load` never fails; a missing or unreadable record is the default state.
//! `save` writes a sibling temp file and renames it over the target so a
//! crash mid-write leaves the previous record intact. Last writer wins.

use std::io;
use std::path::{Path, PathBuf};

use dealwatch_core::PersistedState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create state directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/state_<key>.json`. `key` must already be sanitized.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("state_{key}.json"))
    }

    /// Loads the record for `key`, normalizing anything missing or malformed
    /// to the default state.
    #[must_use]
    pub fn load(&self, key: &str) -> PersistedState {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(value) => PersistedState::from_value(&value),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "state file is not valid JSON, starting fresh");
                    PersistedState::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => PersistedState::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read state file, starting fresh");
                PersistedState::default()
            }
        }
    }

    /// Overwrites the record for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the directory cannot be created or the file
    /// cannot be written and moved into place.
    pub fn save(&self, key: &str, state: &PersistedState) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".state_{key}.json.tmp"));
        let mut payload = serde_json::to_vec_pretty(state)?;
        payload.push(b'\n');

        std::fs::write(&tmp, &payload).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "state saved");
        Ok(())
    }
}
