//! The `manage_workout` tool: one entry point for every workout action.

use jiff::{Zoned, civil::Date};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{IdArg, Result, ToolError, normalize_action, required_date, success};
use crate::manager::{
    CreateRequest, ManagerError, UpdateRequest, WorkoutManager, WorkoutRef, parse_date,
};
use crate::model::{EntryKey, Sport, StepSpec};
use crate::remote::FitnessService;
use crate::storage::ScheduleIndex;

pub const ACTIONS: [&str; 6] = [
    "create",
    "list_scheduled",
    "list_library",
    "update",
    "delete",
    "apply_week_plan",
];

const DEFAULT_SPORT: Sport = Sport::Strength;
const DEFAULT_LIBRARY_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkoutArgs {
    action: Option<String>,

    /// Identifies the workout for `update` and `delete`.
    workout_id: Option<IdArg>,

    /// Identifies the workout by its index entry, together with `slot`.
    scheduled_date: Option<String>,

    /// `create`: the date to schedule on. `update`: the date to move to.
    date: Option<String>,

    slot: Option<u8>,

    /// `update`: the slot to move to.
    new_slot: Option<u8>,

    name: Option<String>,
    description: Option<String>,
    sport_type: Option<String>,
    duration_minutes: Option<u32>,
    steps: Option<Vec<StepSpec>>,
    metadata: Option<Map<String, Value>>,

    start_date: Option<String>,
    end_date: Option<String>,
    start: Option<u32>,
    limit: Option<u32>,

    /// Reference date for `apply_week_plan`; defaults to today.
    from_date: Option<String>,

    #[serde(default)]
    dry_run: bool,
}

/// The `manage_workout` tool.
pub fn manage<R: FitnessService, S: ScheduleIndex>(
    manager: &mut WorkoutManager<R, S>,
    args: Value,
) -> Result<Value> {
    let args: WorkoutArgs = serde_json::from_value(args)?;
    let action = args
        .action
        .as_deref()
        .map(normalize_action)
        .ok_or(ManagerError::MissingField("action"))?;

    match action.as_str() {
        "create" => {
            let request = create_request(args)?;
            success(&action, manager.create(request)?)
        }
        "list_scheduled" => {
            let start = required_date("start_date", args.start_date.as_deref())?;
            let end = match args.end_date.as_deref() {
                Some(end) => parse_date("end_date", end)?,
                None => start,
            };
            success(&action, manager.list_scheduled(start, end)?)
        }
        "list_library" => {
            let sport = optional_sport(args.sport_type.as_deref())?;
            let listing = manager.list_library(
                sport,
                args.start.unwrap_or(0),
                args.limit.unwrap_or(DEFAULT_LIBRARY_LIMIT),
            )?;
            success(&action, listing)
        }
        "update" => {
            let request = update_request(args)?;
            success(&action, manager.update(request)?)
        }
        "delete" => {
            let target = target(&args)?;
            success(&action, manager.delete(&target)?)
        }
        "apply_week_plan" => {
            let reference = match args.from_date.as_deref() {
                Some(day) => parse_date("from_date", day)?,
                None => today(),
            };
            success(&action, manager.apply_week_plan(reference, args.dry_run)?)
        }
        _ => Err(ToolError::UnknownAction {
            action,
            supported: &ACTIONS,
        }),
    }
}

fn create_request(args: WorkoutArgs) -> Result<CreateRequest> {
    let name = args
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or(ManagerError::MissingField("name"))?;
    let sport = optional_sport(args.sport_type.as_deref())?.unwrap_or(DEFAULT_SPORT);

    let mut request = CreateRequest::new(name.trim(), sport);
    request.description = args.description;
    request.duration_minutes = args.duration_minutes;
    request.steps = args.steps;
    request.date = args
        .date
        .as_deref()
        .map(|day| parse_date("date", day))
        .transpose()?;
    request.slot = args.slot.unwrap_or(0);
    request.metadata = args.metadata.unwrap_or_default();
    Ok(request)
}

fn update_request(args: WorkoutArgs) -> Result<UpdateRequest> {
    let mut request = UpdateRequest::new(target(&args)?);
    request.name = args.name;
    request.description = args.description;
    request.sport = optional_sport(args.sport_type.as_deref())?;
    request.steps = args.steps;
    request.duration_minutes = args.duration_minutes;
    request.date = args
        .date
        .as_deref()
        .map(|day| parse_date("date", day))
        .transpose()?;
    request.slot = args.new_slot;
    Ok(request)
}

/// The workout an `update` or `delete` acts on: `workout_id` when given,
/// else the index entry at `scheduled_date` and `slot`.
fn target(args: &WorkoutArgs) -> Result<WorkoutRef> {
    if let Some(id) = &args.workout_id {
        return Ok(WorkoutRef::Id(id.clone().into_string()));
    }
    let day = args
        .scheduled_date
        .as_deref()
        .ok_or(ManagerError::MissingField("workout_id or scheduled_date"))?;
    let key = EntryKey::new(parse_date("scheduled_date", day)?, args.slot.unwrap_or(0));
    Ok(WorkoutRef::Entry(key))
}

fn optional_sport(raw: Option<&str>) -> Result<Option<Sport>> {
    raw.filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.parse::<Sport>()
                .map_err(|e| ManagerError::Validation(e.to_string()).into())
        })
        .transpose()
}

fn today() -> Date {
    Zoned::now().date()
}
