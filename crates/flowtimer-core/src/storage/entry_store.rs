//! Durable storage for the scheduled entry list.
//!
//! The list is small and rewritten whole after every mutation, so the store
//! is a single JSON array on disk. Writes go through a temp file and a
//! rename so a crash mid-write never leaves a truncated list behind.

use std::fs;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::scheduler::ScheduledEntry;

use super::data_dir;

/// Load/save port for the scheduled entry list. Loaded once at startup,
/// rewritten whole after every mutation.
pub trait EntryStore {
    fn load(&self) -> Result<Vec<ScheduledEntry>, StorageError>;
    fn save(&self, entries: &[ScheduledEntry]) -> Result<(), StorageError>;
}

/// Entry store writing one JSON array to a file, atomically.
pub struct JsonEntryStore {
    path: PathBuf,
}

impl JsonEntryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at `~/.config/flowtimer/scheduled_entries.json`.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(data_dir()?.join("scheduled_entries.json")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl EntryStore for JsonEntryStore {
    fn load(&self) -> Result<Vec<ScheduledEntry>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, entries: &[ScheduledEntry]) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
