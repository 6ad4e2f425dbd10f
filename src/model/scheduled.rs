//! Scheduled entries: rows of the local by-date index.

use std::fmt;

use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The unique key of a scheduled entry: a calendar date and a slot on that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub date: Date,
    pub slot: u8,
}

impl EntryKey {
    pub fn new(date: Date, slot: u8) -> Self {
        Self { date, slot }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.date, self.slot)
    }
}

/// One workout scheduled on a date, referencing the remote workout by id.
///
/// The remote service is the authority for workout content; this row is the
/// authority only for "what is scheduled when". Nothing verifies that the
/// referenced workout still exists remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEntry {
    pub date: Date,

    #[serde(default)]
    pub slot: u8,

    pub workout_id: String,
    pub workout_name: String,

    /// Sport key as the remote service actually persisted it.
    pub sport_type: String,

    /// Sport key the caller asked for. Differs from `sport_type` after a
    /// compatibility substitution.
    pub requested_sport_type: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ScheduledEntry {
    pub fn new(
        key: EntryKey,
        workout_id: impl Into<String>,
        workout_name: impl Into<String>,
        sport_type: impl Into<String>,
        requested_sport_type: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            date: key.date,
            slot: key.slot,
            workout_id: workout_id.into(),
            workout_name: workout_name.into(),
            sport_type: sport_type.into(),
            requested_sport_type: requested_sport_type.into(),
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.date, self.slot)
    }

    /// Merges `patch` into this entry. Metadata is merged key by key.
    ///
    /// Does not touch `updated_at`; the store does that when it persists.
    pub fn apply(&mut self, patch: EntryPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(slot) = patch.slot {
            self.slot = slot;
        }
        if let Some(id) = patch.workout_id {
            self.workout_id = id;
        }
        if let Some(name) = patch.workout_name {
            self.workout_name = name;
        }
        if let Some(sport) = patch.sport_type {
            self.sport_type = sport;
        }
        if let Some(sport) = patch.requested_sport_type {
            self.requested_sport_type = sport;
        }
        self.metadata.extend(patch.metadata);
    }
}

/// Fields to change on an existing entry. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub date: Option<Date>,
    pub slot: Option<u8>,
    pub workout_id: Option<String>,
    pub workout_name: Option<String>,
    pub sport_type: Option<String>,
    pub requested_sport_type: Option<String>,
    pub metadata: Map<String, Value>,
}

impl EntryPatch {
    /// The key the entry will have once this patch is applied to `current`.
    pub fn target_key(&self, current: EntryKey) -> EntryKey {
        EntryKey::new(
            self.date.unwrap_or(current.date),
            self.slot.unwrap_or(current.slot),
        )
    }
}
