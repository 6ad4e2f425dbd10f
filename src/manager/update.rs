//! Updating existing workouts.
//!
//! The remote service cannot move a workout to another date in place, so a
//! date change re-creates the workout on the new date and deletes the old one.
//! Everything else is a plain replace of the stored workout.

use jiff::civil::Date;
use serde::Serialize;
use serde_json::json;

use super::{
    ManagerError, Result, WorkoutManager, WorkoutRef, entry_metadata, remote_inconsistency,
};
use crate::builder::{self, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES, WorkoutRequest};
use crate::model::{EntryKey, EntryPatch, ScheduledEntry, Sport, StepSpec};
use crate::policy::merge_warnings;
use crate::remote::{FitnessService, RemoteWorkout};
use crate::storage::{ScheduleIndex, StoreError};

const DESCRIPTION_WITHOUT_STEPS: &str = "The description was updated, but the workout's steps \
     do not change unless `steps` are sent.";

/// Input to [`WorkoutManager::update`]. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub target: WorkoutRef,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sport: Option<Sport>,
    pub steps: Option<Vec<StepSpec>>,
    pub duration_minutes: Option<u32>,

    /// Move the workout to this date.
    pub date: Option<Date>,

    /// Move the workout to this slot.
    pub slot: Option<u8>,
}

impl UpdateRequest {
    pub fn new(target: WorkoutRef) -> Self {
        Self {
            target,
            name: None,
            description: None,
            sport: None,
            steps: None,
            duration_minutes: None,
            date: None,
            slot: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// The id the workout has after the update.
    pub workout_id: String,

    /// Set when a date change replaced the workout with a new one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_workout_id: Option<String>,

    pub scheduled_date: Option<Date>,
    pub slot: Option<u8>,
    pub changed_fields: Vec<&'static str>,
    pub requested_sport_type: Sport,
    pub applied_sport_type: Sport,
    pub structured_steps_applied: bool,
    pub warning: Option<String>,
}

impl<R: FitnessService, S: ScheduleIndex> WorkoutManager<R, S> {
    /// Updates a workout's name, description, sport, steps or date.
    ///
    /// Returns without touching anything when nothing would change.
    pub fn update(&mut self, request: UpdateRequest) -> Result<UpdateResult> {
        let (workout_id, entry) = self.resolve(&request.target)?;
        let current = self.remote.get_workout(&workout_id)?;

        let (requested, current_sport) = match (request.sport, current.sport()) {
            (requested, Ok(current)) => (requested.unwrap_or(current), Some(current)),
            (Some(requested), Err(_)) => (requested, None),
            (None, Err(e)) => {
                return Err(ManagerError::Validation(format!(
                    "workout {workout_id}: {e}; send a sport to replace it"
                )));
            }
        };
        let sport = self
            .settings
            .policy
            .resolve(requested)
            .map_err(builder::BuildError::from)?;

        let current_description = current.description.clone().unwrap_or_default();
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(current.workout_name.as_str())
            .to_string();
        let description = request
            .description
            .clone()
            .unwrap_or_else(|| current_description.clone());
        let has_steps = request.steps.is_some();

        let current_key = entry.as_ref().map(ScheduledEntry::key);
        let target_key = match (current_key, request.date) {
            (Some(key), _) => Some(EntryKey::new(
                request.date.unwrap_or(key.date),
                request.slot.unwrap_or(key.slot),
            )),
            (None, Some(date)) => Some(EntryKey::new(date, request.slot.unwrap_or(0))),
            (None, None) => None,
        };
        if request.slot.is_some() && target_key.is_none() {
            return Err(ManagerError::Validation(
                "slot can only change for a scheduled workout or together with date".into(),
            ));
        }

        let mut changed_fields = Vec::new();
        if name != current.workout_name {
            changed_fields.push("name");
        }
        if description != current_description {
            changed_fields.push("description");
        }
        if Some(sport.applied) != current_sport {
            changed_fields.push("sport_type");
        }
        let moved = target_key.is_some() && target_key != current_key;
        if moved {
            changed_fields.push("date");
        }
        if has_steps {
            changed_fields.push("steps");
        }

        let warning = merge_warnings([
            sport.warning.clone(),
            (request.description.is_some() && !has_steps)
                .then(|| DESCRIPTION_WITHOUT_STEPS.to_string()),
        ]);

        if changed_fields.is_empty() {
            tracing::info!(%workout_id, "nothing to update");
            return Ok(UpdateResult {
                workout_id,
                previous_workout_id: None,
                scheduled_date: current_key.map(|key| key.date),
                slot: current_key.map(|key| key.slot),
                changed_fields,
                requested_sport_type: sport.requested,
                applied_sport_type: sport.applied,
                structured_steps_applied: false,
                warning,
            });
        }

        if moved {
            if let Some(target) = target_key {
                if self.index.get(target)?.is_some() {
                    return Err(StoreError::DuplicateEntry(target).into());
                }
            }
        }

        let payload = match &request.steps {
            Some(steps) => {
                let workout_request = WorkoutRequest {
                    name: name.clone(),
                    sport: requested,
                    description: Some(description.clone()).filter(|d| !d.trim().is_empty()),
                    duration_minutes: request
                        .duration_minutes
                        .unwrap_or_else(|| self.inferred_duration_minutes(&current)),
                    steps: Some(steps.clone()),
                };
                builder::build(&workout_request, &self.settings.policy)?.payload
            }
            None => {
                let mut payload = current.to_payload();
                payload.workout_name.clone_from(&name);
                payload.description.clone_from(&description);
                payload.apply_sport(sport.applied);
                payload
            }
        };

        let mut patch = EntryPatch {
            workout_name: Some(name.clone()),
            sport_type: Some(sport.applied.key().to_string()),
            // Without a requested sport the indexed one (e.g. hiit) stays.
            requested_sport_type: request.sport.map(|_| sport.requested.key().to_string()),
            ..EntryPatch::default()
        };
        patch
            .metadata
            .insert("lastAction".into(), json!("update"));
        patch
            .metadata
            .insert("description".into(), json!(payload.description));

        let (new_id, previous_workout_id, warning) = match target_key.filter(|_| moved) {
            Some(target) => {
                let created = self.remote.create_workout(&payload)?;
                self.schedule_or_roll_back(&created.workout_id, target.date)?;

                let applied_key = sport.applied.key();
                let persisted = created
                    .sport_type_key
                    .clone()
                    .unwrap_or_else(|| applied_key.to_string());
                patch.sport_type = Some(persisted.clone());

                let stale = self.remote.delete_workout(&workout_id).err().map(|e| {
                    tracing::warn!(%workout_id, error = %e, "replaced workout could not be deleted");
                    format!("The previous workout {workout_id} could not be deleted: {e}")
                });
                let warning = merge_warnings([
                    warning,
                    remote_inconsistency(applied_key, &persisted),
                    stale,
                ]);

                patch.date = Some(target.date);
                patch.slot = Some(target.slot);
                patch.workout_id = Some(created.workout_id.clone());
                match current_key {
                    Some(key) => {
                        self.index.update(key, patch)?;
                    }
                    None => {
                        let mut entry = ScheduledEntry::new(
                            target,
                            created.workout_id.clone(),
                            name.clone(),
                            persisted,
                            sport.requested.key(),
                        );
                        entry.metadata =
                            entry_metadata(patch.metadata, "update", &payload.description);
                        self.index.add(entry)?;
                    }
                }
                tracing::info!(old = %workout_id, new = %created.workout_id, date = %target.date, "workout moved");
                (created.workout_id, Some(workout_id), warning)
            }
            None => {
                self.remote.update_workout(&workout_id, &payload)?;
                tracing::info!(%workout_id, fields = ?changed_fields, "workout updated");

                if let Some(entry) = &entry {
                    let scheduling_changed = entry.workout_name != name
                        || entry.sport_type != sport.applied.key()
                        || (request.sport.is_some()
                            && entry.requested_sport_type != sport.requested.key());
                    if scheduling_changed {
                        self.index.update(entry.key(), patch)?;
                    }
                }
                (workout_id, None, warning)
            }
        };

        Ok(UpdateResult {
            workout_id: new_id,
            previous_workout_id,
            scheduled_date: target_key.map(|key| key.date),
            slot: target_key.map(|key| key.slot),
            changed_fields,
            requested_sport_type: sport.requested,
            applied_sport_type: sport.applied,
            structured_steps_applied: has_steps,
            warning,
        })
    }

    /// The current workout's length in minutes, for rebuilding it from steps.
    fn inferred_duration_minutes(&self, current: &RemoteWorkout) -> u32 {
        let minutes = match current.estimated_duration_in_secs {
            Some(seconds) if seconds > 0 => (seconds + 30) / 60,
            _ => self.settings.default_duration_minutes,
        };
        minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)
    }
}
