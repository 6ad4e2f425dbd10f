//! Workout manager: remote workouts and the local schedule index, kept in step.
//!
//! Every action validates its input before the first remote call, and touches
//! the index only after the remote side succeeded. A remote failure therefore
//! never leaves a half-applied local change behind.

mod update;

pub use update::UpdateRequest;

use jiff::civil::Date;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::builder::{self, BuildError, StepSource, WorkoutRequest, template};
use crate::model::{CompiledStep, EntryKey, ScheduledEntry, Sport, StepSpec};
use crate::plan::{self, PlanDay};
use crate::policy::{SportPolicy, merge_warnings};
use crate::remote::{FitnessService, RemoteError};
use crate::storage::{ScheduleIndex, StoreError};

/// Library pages are bounded to this many workouts.
pub const MAX_LIBRARY_LIMIT: u32 = 200;

const METADATA_SOURCE: &str = "coach";

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} must use YYYY-MM-DD format, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl ManagerError {
    /// A stable, machine-readable error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField(_)
            | Self::InvalidDate { .. }
            | Self::Validation(_)
            | Self::Build(BuildError::Validation(_) | BuildError::Compile(_)) => "validation",
            Self::Build(BuildError::SportRejected(_)) => "sport_rejected",
            Self::Store(StoreError::DuplicateEntry(_)) => "duplicate_entry",
            Self::Store(StoreError::EntryNotFound(_)) => "entry_not_found",
            Self::Store(StoreError::Corrupt { .. }) => "index_corrupt",
            Self::Store(StoreError::Io(_) | StoreError::Json(_)) => "index_io",
            Self::Remote(RemoteError::Rejected { .. }) => "remote_rejected",
            Self::Remote(RemoteError::NotFound { .. }) => "remote_not_found",
            Self::Remote(RemoteError::Unavailable(_)) => "remote_unavailable",
            Self::Remote(RemoteError::Malformed { .. }) => "remote_malformed",
        }
    }
}

pub type Result<T> = core::result::Result<T, ManagerError>;

/// Parses a `YYYY-MM-DD` argument.
pub fn parse_date(field: &'static str, value: &str) -> Result<Date> {
    value.trim().parse().map_err(|_| ManagerError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Settings the manager needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub policy: SportPolicy,
    pub week_plan: Vec<PlanDay>,
    pub default_duration_minutes: u32,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            policy: SportPolicy::default(),
            week_plan: plan::default_week_plan(),
            default_duration_minutes: builder::DEFAULT_DURATION_MINUTES,
        }
    }
}

/// Identifies an existing workout: by remote id or by its scheduled slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkoutRef {
    Id(String),
    Entry(EntryKey),
}

/// Input to [`WorkoutManager::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    pub name: String,
    pub sport: Sport,
    pub description: Option<String>,
    pub duration_minutes: Option<u32>,
    pub steps: Option<Vec<StepSpec>>,

    /// When set, the workout is scheduled and indexed on this date.
    pub date: Option<Date>,
    pub slot: u8,
    pub metadata: Map<String, Value>,
}

impl CreateRequest {
    pub fn new(name: impl Into<String>, sport: Sport) -> Self {
        Self {
            name: name.into(),
            sport,
            description: None,
            duration_minutes: None,
            steps: None,
            date: None,
            slot: 0,
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResult {
    pub workout_id: String,
    pub workout_name: String,
    pub scheduled_date: Option<Date>,
    pub slot: u8,

    /// The sport the remote service persisted.
    pub sport_type: String,
    pub requested_sport_type: Sport,
    pub applied_sport_type: Sport,
    pub structured_steps_applied: bool,
    pub step_source: StepSource,
    pub estimated_duration_in_secs: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_response: Option<Value>,

    pub warning: Option<String>,
}

/// Whether the remote lookup for a scheduled entry succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteStatus {
    Found,
    Missing,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledItem {
    #[serde(flatten)]
    pub entry: ScheduledEntry,

    pub remote_status: RemoteStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration_in_secs: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledListing {
    pub start_date: Date,
    pub end_date: Date,
    pub count: usize,
    pub items: Vec<ScheduledItem>,

    /// Ids of indexed workouts the remote service no longer has.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryListing {
    pub start: u32,
    pub limit: u32,
    pub sport_type: Option<Sport>,
    pub count: usize,
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub workout_id: String,

    /// The index entry removed along with the workout, if there was one.
    pub removed_entry: Option<EntryKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
pub enum PlanItem {
    Planned {
        weekday: &'static str,
        template: String,
        scheduled_date: Date,
        workout_name: String,
        sport_type: Sport,
        estimated_duration_in_secs: u32,
        top_level_steps: Vec<Value>,
    },
    Success {
        weekday: &'static str,
        template: String,
        #[serde(flatten)]
        created: CreateResult,
    },
    Error {
        weekday: &'static str,
        template: String,
        scheduled_date: Option<Date>,
        kind: &'static str,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekPlanResult {
    pub reference_date: Date,
    pub dry_run: bool,
    pub count: usize,
    pub failed: usize,
    pub items: Vec<PlanItem>,
}

/// Runs workout actions against a remote service and a schedule index.
pub struct WorkoutManager<R, S> {
    remote: R,
    index: S,
    settings: ManagerSettings,
}

impl<R: FitnessService, S: ScheduleIndex> WorkoutManager<R, S> {
    pub fn new(remote: R, index: S, settings: ManagerSettings) -> Self {
        Self {
            remote,
            index,
            settings,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn index(&self) -> &S {
        &self.index
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// Builds, creates and (when dated) schedules and indexes a workout.
    pub fn create(&mut self, request: CreateRequest) -> Result<CreateResult> {
        let CreateRequest {
            name,
            sport,
            description,
            duration_minutes,
            steps,
            date,
            slot,
            metadata,
        } = request;

        let workout_request = WorkoutRequest {
            name,
            sport,
            description,
            duration_minutes: duration_minutes.unwrap_or(self.settings.default_duration_minutes),
            steps,
        };
        let built = builder::build(&workout_request, &self.settings.policy)?;

        let key = date.map(|date| EntryKey::new(date, slot));
        if let Some(key) = key {
            if self.index.get(key)?.is_some() {
                return Err(StoreError::DuplicateEntry(key).into());
            }
        }

        let created = self.remote.create_workout(&built.payload)?;
        tracing::info!(workout_id = %created.workout_id, name = %built.payload.workout_name, "workout created");

        let schedule_response = match key {
            Some(key) => Some(self.schedule_or_roll_back(&created.workout_id, key.date)?),
            None => None,
        };

        let applied_key = built.sport.applied.key();
        let persisted = created
            .sport_type_key
            .clone()
            .unwrap_or_else(|| applied_key.to_string());
        let warning = merge_warnings([
            built.warning().map(str::to_string),
            remote_inconsistency(applied_key, &persisted),
        ]);

        if let Some(key) = key {
            let mut entry = ScheduledEntry::new(
                key,
                created.workout_id.clone(),
                built.payload.workout_name.clone(),
                persisted.clone(),
                built.sport.requested.key(),
            );
            entry.metadata = entry_metadata(metadata, "create", &built.payload.description);
            self.index.add(entry)?;
        }

        Ok(CreateResult {
            workout_id: created.workout_id,
            workout_name: built.payload.workout_name.clone(),
            scheduled_date: date,
            slot,
            sport_type: persisted,
            requested_sport_type: built.sport.requested,
            applied_sport_type: built.sport.applied,
            structured_steps_applied: built.structured_steps_applied(),
            step_source: built.source,
            estimated_duration_in_secs: built.payload.estimated_duration_in_secs,
            schedule_response,
            warning,
        })
    }

    /// Indexed workouts dated within `[start, end]`, joined with remote details.
    ///
    /// Lookups are best-effort: a failed lookup is reported on its item and
    /// does not fail the listing.
    pub fn list_scheduled(&self, start: Date, end: Date) -> Result<ScheduledListing> {
        let entries = self.index.list_range(start, end)?;
        let mut missing = Vec::new();

        let items: Vec<ScheduledItem> = entries
            .into_iter()
            .map(|entry| match self.remote.get_workout(&entry.workout_id) {
                Ok(workout) => ScheduledItem {
                    entry,
                    remote_status: RemoteStatus::Found,
                    description: workout.description,
                    estimated_duration_in_secs: workout.estimated_duration_in_secs,
                    lookup_error: None,
                },
                Err(RemoteError::NotFound { .. }) => {
                    missing.push(entry.workout_id.clone());
                    ScheduledItem {
                        entry,
                        remote_status: RemoteStatus::Missing,
                        description: None,
                        estimated_duration_in_secs: None,
                        lookup_error: None,
                    }
                }
                Err(e) => {
                    tracing::warn!(workout_id = %entry.workout_id, error = %e, "remote lookup failed");
                    ScheduledItem {
                        entry,
                        remote_status: RemoteStatus::Error,
                        description: None,
                        estimated_duration_in_secs: None,
                        lookup_error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        Ok(ScheduledListing {
            start_date: start,
            end_date: end,
            count: items.len(),
            items,
            missing,
        })
    }

    /// One page of the remote library, optionally filtered by sport.
    pub fn list_library(&self, sport: Option<Sport>, start: u32, limit: u32) -> Result<LibraryListing> {
        let limit = limit.clamp(1, MAX_LIBRARY_LIMIT);
        let mut items = self.remote.list_library(start, limit)?;
        if let Some(sport) = sport {
            items.retain(|workout| workout["sportType"]["sportTypeKey"] == sport.key());
        }
        Ok(LibraryListing {
            start,
            limit,
            sport_type: sport,
            count: items.len(),
            items,
        })
    }

    /// Deletes a workout remotely, then drops its index entry.
    pub fn delete(&mut self, target: &WorkoutRef) -> Result<DeleteResult> {
        let (workout_id, entry) = self.resolve(target)?;

        self.remote.delete_workout(&workout_id)?;
        tracing::info!(%workout_id, "workout deleted");

        let removed_entry = match entry {
            Some(entry) => {
                self.index.delete(entry.key())?;
                Some(entry.key())
            }
            None => None,
        };

        Ok(DeleteResult {
            workout_id,
            removed_entry,
        })
    }

    /// Creates the configured week plan, starting the day after `reference`.
    ///
    /// Each day stands alone: a failure is reported on its item and the
    /// remaining days still run. A dry run only previews.
    pub fn apply_week_plan(&mut self, reference: Date, dry_run: bool) -> Result<WeekPlanResult> {
        if self.settings.week_plan.is_empty() {
            return Err(ManagerError::Validation("no week plan is configured".into()));
        }

        let days = self.settings.week_plan.clone();
        let items: Vec<PlanItem> = days
            .iter()
            .map(|day| self.apply_plan_day(reference, day, dry_run))
            .collect();
        let failed = items
            .iter()
            .filter(|item| matches!(item, PlanItem::Error { .. }))
            .count();

        Ok(WeekPlanResult {
            reference_date: reference,
            dry_run,
            count: items.len(),
            failed,
            items,
        })
    }

    fn apply_plan_day(&mut self, reference: Date, day: &PlanDay, dry_run: bool) -> PlanItem {
        let weekday = plan::weekday_label(day.weekday);
        let error = |scheduled_date, e: ManagerError| {
            tracing::warn!(weekday, template = %day.template, error = %e, "week plan day failed");
            PlanItem::Error {
                weekday,
                template: day.template.clone(),
                scheduled_date,
                kind: e.kind(),
                error: e.to_string(),
            }
        };

        let scheduled_date = match plan::next_weekday(reference, day.weekday) {
            Ok(date) => date,
            Err(e) => return error(None, ManagerError::Validation(e.to_string())),
        };
        let Some(template) = template::by_key(&day.template) else {
            let e = ManagerError::Validation(format!("unknown template '{}'", day.template));
            return error(Some(scheduled_date), e);
        };

        if dry_run {
            let request = WorkoutRequest::from_template(template);
            return match builder::build(&request, &self.settings.policy) {
                Ok(built) => PlanItem::Planned {
                    weekday,
                    template: day.template.clone(),
                    scheduled_date,
                    workout_name: built.payload.workout_name.clone(),
                    sport_type: built.sport.applied,
                    estimated_duration_in_secs: built.payload.estimated_duration_in_secs,
                    top_level_steps: built.payload.steps().iter().map(step_overview).collect(),
                },
                Err(e) => error(Some(scheduled_date), e.into()),
            };
        }

        let mut request = CreateRequest::new(template.name, template.sport);
        request.description = Some(template.description.to_string());
        request.steps = Some(template.steps());
        request.date = Some(scheduled_date);
        request.slot = day.slot;
        request
            .metadata
            .insert("template".into(), json!(template.key));

        match self.create(request) {
            Ok(created) => PlanItem::Success {
                weekday,
                template: day.template.clone(),
                created,
            },
            Err(e) => error(Some(scheduled_date), e),
        }
    }

    /// Finds the remote id and, if indexed, the entry of `target`.
    fn resolve(&self, target: &WorkoutRef) -> Result<(String, Option<ScheduledEntry>)> {
        match target {
            WorkoutRef::Id(id) => {
                let id = id.trim();
                if id.is_empty() {
                    return Err(ManagerError::MissingField("workout_id"));
                }
                Ok((id.to_string(), self.index.find_by_workout(id)?))
            }
            WorkoutRef::Entry(key) => {
                let entry = self
                    .index
                    .get(*key)?
                    .ok_or(StoreError::EntryNotFound(*key))?;
                Ok((entry.workout_id.clone(), Some(entry)))
            }
        }
    }

    /// Schedules `workout_id`; if that fails, deletes the freshly created
    /// workout so it is not left orphaned, and returns the schedule error.
    fn schedule_or_roll_back(&self, workout_id: &str, date: Date) -> Result<Value> {
        match self.remote.schedule_workout(workout_id, date) {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(%workout_id, %date, error = %e, "scheduling failed, removing created workout");
                if let Err(cleanup) = self.remote.delete_workout(workout_id) {
                    tracing::error!(%workout_id, error = %cleanup, "failed to remove unscheduled workout");
                }
                Err(e.into())
            }
        }
    }
}

/// Warning for a remote service that persisted a different sport than sent.
fn remote_inconsistency(applied: &str, persisted: &str) -> Option<String> {
    (applied != persisted).then(|| {
        format!(
            "The remote service stored the workout as {persisted} instead of {applied}; \
             the index records {persisted}."
        )
    })
}

/// Caller metadata plus the fields the manager tracks on every entry.
fn entry_metadata(
    mut metadata: Map<String, Value>,
    action: &str,
    description: &str,
) -> Map<String, Value> {
    metadata.insert("source".into(), json!(METADATA_SOURCE));
    metadata.insert("lastAction".into(), json!(action));
    metadata.insert("description".into(), json!(description));
    metadata
}

/// A one-line view of a top-level compiled step.
fn step_overview(step: &CompiledStep) -> Value {
    match step {
        CompiledStep::Executable(step) => json!({
            "type": "step",
            "stepType": step.step_type.step_type_key,
            "description": step.description,
        }),
        CompiledStep::RepeatGroup(group) => json!({
            "type": "repeat_group",
            "iterations": group.number_of_iterations,
            "children": group.workout_steps.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use pretty_assertions::assert_eq;

    use crate::remote::fake::FakeService;
    use crate::storage::MemoryIndex;

    pub(crate) type TestManager = WorkoutManager<FakeService, MemoryIndex>;

    pub(crate) fn test_manager() -> TestManager {
        WorkoutManager::new(FakeService::new(), MemoryIndex::new(), ManagerSettings::default())
    }

    pub(crate) fn strength_steps() -> Vec<StepSpec> {
        vec![
            StepSpec::timed("warmup", 300, "Warm up"),
            StepSpec::repeat(
                3,
                vec![
                    StepSpec::reps(12, "Squats"),
                    StepSpec::timed("rest", 60, "Rest"),
                ],
            ),
        ]
    }

    pub(crate) fn dated_request(name: &str, day: Date) -> CreateRequest {
        let mut request = CreateRequest::new(name, Sport::Strength);
        request.steps = Some(strength_steps());
        request.date = Some(day);
        request
    }

    #[test]
    fn create_schedules_and_indexes() {
        let mut manager = test_manager();
        let result = manager
            .create(dated_request("Legs", date(2026, 2, 16)))
            .unwrap();

        assert_eq!(result.scheduled_date, Some(date(2026, 2, 16)));
        assert!(result.structured_steps_applied);
        assert_eq!(result.warning, None);
        assert_eq!(result.estimated_duration_in_secs, 300 + 3 * (36 + 60));

        let entries = manager.index().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].workout_id, result.workout_id);
        assert_eq!(entries[0].metadata["lastAction"], "create");
        assert_eq!(
            manager.remote().state.borrow().scheduled,
            vec![(result.workout_id.clone(), date(2026, 2, 16))]
        );
    }

    #[test]
    fn create_hiit_applies_cardio_and_records_request() {
        let mut manager = test_manager();
        let mut request = dated_request("Tabata", date(2026, 2, 17));
        request.sport = Sport::Hiit;

        let result = manager.create(request).unwrap();

        assert_eq!(result.requested_sport_type, Sport::Hiit);
        assert_eq!(result.applied_sport_type, Sport::Cardio);
        assert_eq!(result.sport_type, "cardio_training");
        assert!(!result.warning.unwrap().is_empty());

        let entry = &manager.index().entries()[0];
        assert_eq!(entry.sport_type, "cardio_training");
        assert_eq!(entry.requested_sport_type, "hiit");
    }

    #[test]
    fn create_on_taken_slot_never_reaches_remote() {
        let mut manager = test_manager();
        manager.create(dated_request("Legs", date(2026, 2, 16))).unwrap();
        let calls_before = manager.remote().calls().len();

        let err = manager
            .create(dated_request("Arms", date(2026, 2, 16)))
            .unwrap_err();

        assert_eq!(err.kind(), "duplicate_entry");
        assert_eq!(manager.remote().calls().len(), calls_before);
        assert_eq!(manager.index().entries().len(), 1);
    }

    #[test]
    fn create_validation_happens_before_remote() {
        let mut manager = test_manager();
        let mut request = dated_request("Broken", date(2026, 2, 16));
        request.steps = Some(vec![StepSpec::repeat(0, strength_steps())]);

        let err = manager.create(request).unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert!(manager.remote().calls().is_empty());
    }

    #[test]
    fn schedule_failure_removes_created_workout() {
        let mut manager = test_manager();
        manager
            .remote()
            .fail("schedule", RemoteError::Unavailable("timeout".into()));

        let err = manager
            .create(dated_request("Legs", date(2026, 2, 16)))
            .unwrap_err();

        assert_eq!(err.kind(), "remote_unavailable");
        assert!(manager.remote().state.borrow().workouts.is_empty());
        assert!(manager.index().entries().is_empty());
    }

    #[test]
    fn remote_sport_downgrade_is_a_warning() {
        let mut manager = test_manager();
        *manager.remote().persisted_sport.borrow_mut() = Some("cardio_training".into());

        let result = manager
            .create(dated_request("Legs", date(2026, 2, 16)))
            .unwrap();

        assert_eq!(result.applied_sport_type, Sport::Strength);
        assert_eq!(result.sport_type, "cardio_training");
        assert!(result.warning.unwrap().contains("cardio_training"));
        assert_eq!(manager.index().entries()[0].sport_type, "cardio_training");
    }

    #[test]
    fn undated_create_is_not_indexed() {
        let mut manager = test_manager();
        let mut request = CreateRequest::new("Library only", Sport::Running);
        request.description = Some("Easy".into());

        let result = manager.create(request).unwrap();

        assert_eq!(result.scheduled_date, None);
        assert_eq!(result.step_source, StepSource::Fallback);
        assert!(manager.index().entries().is_empty());
        assert!(!manager.remote().calls().contains(&"schedule".to_string()));
    }

    #[test]
    fn list_scheduled_reports_missing_and_failed_lookups() {
        let mut manager = test_manager();
        let kept = manager.create(dated_request("Kept", date(2026, 2, 16))).unwrap();
        let gone = manager.create(dated_request("Gone", date(2026, 2, 18))).unwrap();
        manager
            .remote()
            .state
            .borrow_mut()
            .workouts
            .remove(&gone.workout_id);

        let listing = manager
            .list_scheduled(date(2026, 2, 16), date(2026, 2, 22))
            .unwrap();

        assert_eq!(listing.count, 2);
        assert_eq!(listing.items[0].entry.workout_id, kept.workout_id);
        assert_eq!(listing.items[0].remote_status, RemoteStatus::Found);
        assert_eq!(listing.items[1].remote_status, RemoteStatus::Missing);
        assert_eq!(listing.missing, vec![gone.workout_id]);

        manager
            .remote()
            .fail("get", RemoteError::Unavailable("down".into()));
        let listing = manager
            .list_scheduled(date(2026, 2, 16), date(2026, 2, 16))
            .unwrap();
        assert_eq!(listing.items[0].remote_status, RemoteStatus::Error);
        assert!(listing.items[0].lookup_error.is_some());
    }

    #[test]
    fn list_library_filters_and_bounds() {
        let manager = test_manager();
        manager.remote().state.borrow_mut().library = vec![
            json!({"workoutId": 1, "sportType": {"sportTypeKey": "running"}}),
            json!({"workoutId": 2, "sportType": {"sportTypeKey": "strength_training"}}),
            json!({"workoutId": 3, "sportType": {"sportTypeKey": "running"}}),
        ];

        let listing = manager.list_library(Some(Sport::Running), 0, 0).unwrap();
        assert_eq!(listing.limit, 1);
        assert_eq!(listing.count, 1);

        let listing = manager.list_library(Some(Sport::Running), 0, 5000).unwrap();
        assert_eq!(listing.limit, MAX_LIBRARY_LIMIT);
        assert_eq!(listing.count, 2);
    }

    #[test]
    fn delete_removes_remote_and_entry() {
        let mut manager = test_manager();
        let created = manager.create(dated_request("Legs", date(2026, 2, 16))).unwrap();

        let result = manager
            .delete(&WorkoutRef::Entry(EntryKey::new(date(2026, 2, 16), 0)))
            .unwrap();

        assert_eq!(result.workout_id, created.workout_id);
        assert_eq!(result.removed_entry, Some(EntryKey::new(date(2026, 2, 16), 0)));
        assert!(manager.index().entries().is_empty());
        assert!(manager.remote().workout(&created.workout_id).is_none());
    }

    #[test]
    fn remote_delete_failure_keeps_entry() {
        let mut manager = test_manager();
        let created = manager.create(dated_request("Legs", date(2026, 2, 16))).unwrap();
        manager.remote().fail(
            "delete",
            RemoteError::Rejected {
                operation: "delete-workout".into(),
                message: "locked".into(),
            },
        );

        let err = manager
            .delete(&WorkoutRef::Id(created.workout_id.clone()))
            .unwrap_err();

        assert_eq!(err.kind(), "remote_rejected");
        assert_eq!(manager.index().entries().len(), 1);
        assert_eq!(manager.index().entries()[0].workout_id, created.workout_id);
    }

    #[test]
    fn delete_unknown_entry_fails() {
        let mut manager = test_manager();
        let err = manager
            .delete(&WorkoutRef::Entry(EntryKey::new(date(2026, 2, 16), 0)))
            .unwrap_err();
        assert_eq!(err.kind(), "entry_not_found");
        assert!(manager.remote().calls().is_empty());
    }

    #[test]
    fn week_plan_dry_run_has_no_side_effects() {
        let mut manager = test_manager();
        let result = manager.apply_week_plan(date(2026, 2, 16), true).unwrap();

        assert_eq!(result.count, 4);
        assert_eq!(result.failed, 0);
        assert!(manager.remote().calls().is_empty());
        assert!(manager.index().entries().is_empty());
        match &result.items[0] {
            PlanItem::Planned {
                scheduled_date,
                template,
                ..
            } => {
                // A Monday reference rolls to the next Monday.
                assert_eq!(*scheduled_date, date(2026, 2, 23));
                assert_eq!(template, "strength-a");
            }
            other => panic!("expected a planned item, got {other:?}"),
        }
    }

    #[test]
    fn week_plan_reports_per_day_failures() {
        let mut manager = test_manager();
        manager.settings.week_plan.push(PlanDay::new(
            jiff::civil::Weekday::Sunday,
            "no-such-template",
        ));
        // Take Wednesday's slot so that day collides.
        manager.create(dated_request("Busy", date(2026, 2, 18))).unwrap();

        let result = manager.apply_week_plan(date(2026, 2, 16), false).unwrap();

        assert_eq!(result.count, 5);
        assert_eq!(result.failed, 2);
        assert!(matches!(
            &result.items[1],
            PlanItem::Error { kind: "duplicate_entry", .. }
        ));
        assert!(matches!(&result.items[4], PlanItem::Error { kind: "validation", .. }));
        // Monday, Friday and Saturday were created, plus the pre-existing entry.
        assert_eq!(manager.index().entries().len(), 4);
    }

    #[test]
    fn week_plan_hiit_template_falls_back_to_cardio() {
        let mut manager = test_manager();
        let result = manager.apply_week_plan(date(2026, 2, 16), false).unwrap();

        match &result.items[2] {
            PlanItem::Success { created, .. } => {
                assert_eq!(created.requested_sport_type, Sport::Hiit);
                assert_eq!(created.applied_sport_type, Sport::Cardio);
                assert_eq!(created.scheduled_date, Some(date(2026, 2, 20)));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(ManagerError::MissingField("date").kind(), "validation");
        assert_eq!(
            parse_date("date", "16/02/2026").unwrap_err().kind(),
            "validation"
        );
        assert_eq!(parse_date("date", "2026-02-16").unwrap(), date(2026, 2, 16));
    }
}
