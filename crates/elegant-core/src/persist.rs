//! JSON snapshots of local state.
//!
//! Only the note collection and the sort key are persisted. Transient view
//! state (active note, search, tag filter, archive toggle) starts fresh.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Note, SortBy};

const SNAPSHOT_VERSION: u32 = 1;
const NOTES_FILE: &str = "notes.json";
const SYNC_STATE_FILE: &str = "sync-state.json";

/// Persisted subset of store state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedNotes {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub sort_by: SortBy,
}

#[derive(Debug, Serialize, Deserialize)]
struct Versioned<T> {
    version: u32,
    #[serde(flatten)]
    body: T,
}

/// Owners whose local-only notes have already been uploaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMarkers {
    #[serde(default)]
    migrated_owners: Vec<String>,
}

impl SyncMarkers {
    #[must_use]
    pub fn is_migrated(&self, owner: &str) -> bool {
        self.migrated_owners.iter().any(|existing| existing == owner)
    }

    pub fn mark_migrated(&mut self, owner: &str) {
        if !self.is_migrated(owner) {
            self.migrated_owners.push(owner.to_string());
        }
    }
}

/// Directory holding the local snapshot files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStateDir {
    root: PathBuf,
}

impl LocalStateDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn notes_path(&self) -> PathBuf {
        self.root.join(NOTES_FILE)
    }

    /// Load the note snapshot; a missing file is an empty store
    pub fn load_notes(&self) -> Result<PersistedNotes> {
        read_versioned(&self.notes_path()).map(Option::unwrap_or_default)
    }

    pub fn save_notes(&self, notes: &PersistedNotes) -> Result<()> {
        write_versioned(&self.notes_path(), notes)
    }

    pub fn load_sync_markers(&self) -> Result<SyncMarkers> {
        read_versioned(&self.root.join(SYNC_STATE_FILE)).map(Option::unwrap_or_default)
    }

    pub fn save_sync_markers(&self, markers: &SyncMarkers) -> Result<()> {
        write_versioned(&self.root.join(SYNC_STATE_FILE), markers)
    }
}

fn read_versioned<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error.into()),
    };

    let parsed: Versioned<T> = serde_json::from_str(&raw)?;
    if parsed.version != SNAPSHOT_VERSION {
        return Err(Error::InvalidInput(format!(
            "unsupported snapshot version {} in {}",
            parsed.version,
            path.display()
        )));
    }
    Ok(Some(parsed.body))
}

fn write_versioned<T: Serialize>(path: &Path, body: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string_pretty(&Versioned {
        version: SNAPSHOT_VERSION,
        body,
    })?;
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, format!("{payload}\n"))?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
