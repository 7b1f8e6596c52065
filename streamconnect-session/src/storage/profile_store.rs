use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use streamconnect_core::{MeetingRecord, UserProfile};
use tracing::warn;

use crate::error::StorageError;

const HISTORY_LIMIT: usize = 10;

/// On-disk layout: one JSON document for the profile and the history.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    user: Option<UserProfile>,
    #[serde(default)]
    history: Vec<MeetingRecord>,
}

/// Persistent user profile and meeting history.
///
/// Reads are lenient, a missing or corrupt file just means an empty
/// store. Writes are strict and surface [`StorageError`].
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_user(&self) -> Option<UserProfile> {
        self.read_file().user
    }

    pub fn save_user(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let mut store = self.read_file();
        store.user = Some(profile.clone());
        self.write_file(&store)
    }

    pub fn clear_user(&self) -> Result<(), StorageError> {
        let mut store = self.read_file();
        store.user = None;
        self.write_file(&store)
    }

    /// Meeting history, most recent first.
    pub fn history(&self) -> Vec<MeetingRecord> {
        self.read_file().history
    }

    /// Puts a meeting at the top of the history, keeping one entry per
    /// room and at most [`HISTORY_LIMIT`] entries overall.
    pub fn add_to_history(&self, record: MeetingRecord) -> Result<(), StorageError> {
        let mut store = self.read_file();
        store.history.retain(|r| r.room != record.room);
        store.history.insert(0, record);
        store.history.truncate(HISTORY_LIMIT);
        self.write_file(&store)
    }

    fn read_file(&self) -> StoreFile {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return StoreFile::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "store file unreadable, starting fresh");
                StoreFile::default()
            }
        }
    }

    fn write_file(&self, store: &StoreFile) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(store)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
