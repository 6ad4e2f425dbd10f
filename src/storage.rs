//! Local index of scheduled workouts.
//!
//! The remote service cannot list workouts by date range, so every workout
//! this tool schedules is also recorded here, keyed by `(date, slot)`. The
//! remote service stays the authority for workout content; the index is the
//! authority only for what is scheduled when.
//!
//! The index is a single JSON document:
//!
//! ```text
//! { "schemaVersion": 1, "entries": [ ScheduledEntry, ... ] }
//! ```
//!
//! Entries keep insertion order on disk. Two implementations share the same
//! document logic: [`FileIndex`] for real use and [`MemoryIndex`] for tests
//! and dry runs.

mod file;

pub use file::FileIndex;

use std::{io, path::PathBuf};

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::model::{EntryKey, EntryPatch, ScheduledEntry};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a workout is already scheduled at {0}")]
    DuplicateEntry(EntryKey),

    #[error("no scheduled workout at {0}")]
    EntryNotFound(EntryKey),

    #[error("index file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// Storage for scheduled entries keyed by `(date, slot)`.
///
/// Single-process: implementations do no cross-process locking.
pub trait ScheduleIndex {
    /// Adds a new entry. Fails with [`StoreError::DuplicateEntry`] if its key
    /// is taken, leaving the index untouched.
    fn add(&mut self, entry: ScheduledEntry) -> Result<()>;

    /// Entries dated within `[start, end]`, by date then insertion order.
    /// An inverted range is empty.
    fn list_range(&self, start: Date, end: Date) -> Result<Vec<ScheduledEntry>>;

    fn get(&self, key: EntryKey) -> Result<Option<ScheduledEntry>>;

    /// Applies `patch` to the entry at `key` and refreshes `updated_at`.
    /// Returns the updated entry.
    fn update(&mut self, key: EntryKey, patch: EntryPatch) -> Result<ScheduledEntry>;

    /// Removes and returns the entry at `key`.
    fn delete(&mut self, key: EntryKey) -> Result<ScheduledEntry>;

    /// The entry referencing remote workout `workout_id`, if any.
    fn find_by_workout(&self, workout_id: &str) -> Result<Option<ScheduledEntry>>;
}

/// The whole index as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub schema_version: u32,

    #[serde(default)]
    pub entries: Vec<ScheduledEntry>,
}

impl Default for IndexDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }
}

impl IndexDocument {
    fn position(&self, key: EntryKey) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key() == key)
    }

    pub fn get(&self, key: EntryKey) -> Option<&ScheduledEntry> {
        self.entries.iter().find(|entry| entry.key() == key)
    }

    pub fn add(&mut self, entry: ScheduledEntry) -> Result<()> {
        let key = entry.key();
        if self.position(key).is_some() {
            return Err(StoreError::DuplicateEntry(key));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn list_range(&self, start: Date, end: Date) -> Vec<ScheduledEntry> {
        if start > end {
            return Vec::new();
        }
        let mut entries: Vec<ScheduledEntry> = self
            .entries
            .iter()
            .filter(|entry| (start..=end).contains(&entry.date))
            .cloned()
            .collect();
        // Stable: same-date entries stay in insertion order.
        entries.sort_by_key(|entry| entry.date);
        entries
    }

    pub fn update(&mut self, key: EntryKey, patch: EntryPatch) -> Result<ScheduledEntry> {
        let index = self.position(key).ok_or(StoreError::EntryNotFound(key))?;

        let target = patch.target_key(key);
        if target != key && self.position(target).is_some() {
            return Err(StoreError::DuplicateEntry(target));
        }

        let entry = &mut self.entries[index];
        entry.apply(patch);
        entry.updated_at = Timestamp::now();
        Ok(entry.clone())
    }

    pub fn delete(&mut self, key: EntryKey) -> Result<ScheduledEntry> {
        let index = self.position(key).ok_or(StoreError::EntryNotFound(key))?;
        Ok(self.entries.remove(index))
    }

    pub fn find_by_workout(&self, workout_id: &str) -> Option<&ScheduledEntry> {
        self.entries
            .iter()
            .find(|entry| entry.workout_id == workout_id)
    }
}

/// An index held in memory only.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    document: IndexDocument,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScheduledEntry] {
        &self.document.entries
    }
}

impl ScheduleIndex for MemoryIndex {
    fn add(&mut self, entry: ScheduledEntry) -> Result<()> {
        self.document.add(entry)
    }

    fn list_range(&self, start: Date, end: Date) -> Result<Vec<ScheduledEntry>> {
        Ok(self.document.list_range(start, end))
    }

    fn get(&self, key: EntryKey) -> Result<Option<ScheduledEntry>> {
        Ok(self.document.get(key).cloned())
    }

    fn update(&mut self, key: EntryKey, patch: EntryPatch) -> Result<ScheduledEntry> {
        self.document.update(key, patch)
    }

    fn delete(&mut self, key: EntryKey) -> Result<ScheduledEntry> {
        self.document.delete(key)
    }

    fn find_by_workout(&self, workout_id: &str) -> Result<Option<ScheduledEntry>> {
        Ok(self.document.find_by_workout(workout_id).cloned())
    }
}
