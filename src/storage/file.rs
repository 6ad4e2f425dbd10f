//! File-backed index with atomic writes.
//!
//! Every operation loads the whole document. Every mutation writes a complete
//! new document to a temporary file next to the index, syncs it, and renames
//! it over the index. A crash before the rename leaves the previous index in
//! place; at worst a stray `*.tmp` file remains.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use jiff::civil::Date;
use uuid::Uuid;

use super::{IndexDocument, Result, SCHEMA_VERSION, ScheduleIndex, StoreError};
use crate::model::{EntryKey, EntryPatch, ScheduledEntry};

/// The scheduled index stored as one JSON file.
#[derive(Debug, Clone)]
pub struct FileIndex {
    path: PathBuf,
}

impl FileIndex {
    /// An index at `path`. Nothing is read or created until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default index path: `~/.coach/scheduled_workouts.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".coach").join("scheduled_workouts.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole index. A missing file is an empty index; a file that
    /// does not parse is an error, never silently reset.
    pub fn load(&self) -> Result<IndexDocument> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(IndexDocument::default()),
            Err(e) => return Err(e.into()),
        };

        let document: IndexDocument =
            serde_json::from_str(&json).map_err(|e| self.corrupt(e.to_string()))?;
        if document.schema_version != SCHEMA_VERSION {
            return Err(self.corrupt(format!(
                "unsupported schema version {} (expected {SCHEMA_VERSION})",
                document.schema_version
            )));
        }
        Ok(document)
    }

    /// Writes `document` to a synced temporary file without touching the index.
    pub fn stage(&self, document: &IndexDocument) -> Result<StagedWrite> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "index".into(), |n| n.to_string_lossy().into_owned());
        let temp = dir.join(format!("{file_name}.{}.tmp", Uuid::new_v4()));

        let staged = StagedWrite {
            temp,
            target: self.path.clone(),
            committed: false,
        };

        let mut json = serde_json::to_string_pretty(document)?;
        json.push('\n');
        let mut file = File::create(&staged.temp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        Ok(staged)
    }

    /// Stages and commits `document`.
    pub fn save(&self, document: &IndexDocument) -> Result<()> {
        self.stage(document)?.commit()
    }

    /// Loads, applies `mutate`, and saves only if `mutate` succeeds.
    fn mutate<T>(&self, mutate: impl FnOnce(&mut IndexDocument) -> Result<T>) -> Result<T> {
        let mut document = self.load()?;
        let value = mutate(&mut document)?;
        self.save(&document)?;
        Ok(value)
    }

    fn corrupt(&self, reason: String) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

impl ScheduleIndex for FileIndex {
    fn add(&mut self, entry: ScheduledEntry) -> Result<()> {
        let key = entry.key();
        self.mutate(|document| document.add(entry))?;
        tracing::debug!(%key, path = %self.path.display(), "index entry added");
        Ok(())
    }

    fn list_range(&self, start: Date, end: Date) -> Result<Vec<ScheduledEntry>> {
        Ok(self.load()?.list_range(start, end))
    }

    fn get(&self, key: EntryKey) -> Result<Option<ScheduledEntry>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn update(&mut self, key: EntryKey, patch: EntryPatch) -> Result<ScheduledEntry> {
        let entry = self.mutate(|document| document.update(key, patch))?;
        tracing::debug!(%key, new_key = %entry.key(), "index entry updated");
        Ok(entry)
    }

    fn delete(&mut self, key: EntryKey) -> Result<ScheduledEntry> {
        let entry = self.mutate(|document| document.delete(key))?;
        tracing::debug!(%key, "index entry deleted");
        Ok(entry)
    }

    fn find_by_workout(&self, workout_id: &str) -> Result<Option<ScheduledEntry>> {
        Ok(self.load()?.find_by_workout(workout_id).cloned())
    }
}

/// A fully written temporary file waiting to replace the index.
///
/// Dropping it without [`commit`](Self::commit) removes the temporary file.
#[derive(Debug)]
pub struct StagedWrite {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Atomically replaces the index with the staged file.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        sync_parent(&self.target);
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

/// Persists the rename itself. Best effort: not every platform can open a
/// directory for syncing.
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to sync index directory");
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}
