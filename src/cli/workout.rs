//! Workout commands: create, list, update, delete, apply the week plan.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde_json::{Map, Value, json};

use super::read_json;

#[derive(Debug, Subcommand)]
pub enum WorkoutCommand {
    /// Create a workout, scheduled and indexed when `--date` is given.
    ///
    /// Steps come from `--steps` (a JSON array of step objects), a built-in
    /// template matching the name, or a generic warm-up/main/cool-down.
    Create {
        /// Workout name, e.g. "Strength A" or "Leg day".
        name: String,

        /// Sport type: running, strength, cardio or hiit.
        #[arg(long, default_value = "strength")]
        sport: String,

        /// Required unless steps or a template apply.
        #[arg(long)]
        description: Option<String>,

        /// Schedule on this date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,

        /// Slot on the scheduled date, for more than one workout per day.
        #[arg(long)]
        slot: Option<u8>,

        /// Length of the generic fallback workout.
        #[arg(long)]
        duration_minutes: Option<u32>,

        /// JSON file with structured steps; `-` reads stdin.
        #[arg(long)]
        steps: Option<PathBuf>,
    },

    /// List indexed workouts scheduled within a date range.
    ListScheduled {
        /// First date (YYYY-MM-DD).
        start_date: String,

        /// Last date, inclusive. Defaults to the first date.
        end_date: Option<String>,
    },

    /// List workouts in the remote library.
    ListLibrary {
        /// Only workouts of this sport type.
        #[arg(long)]
        sport: Option<String>,

        #[arg(long)]
        start: Option<u32>,

        /// Page size, 1 to 200.
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Update a workout. Changing `--date` re-creates it on the new date.
    Update {
        #[command(flatten)]
        target: TargetArgs,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        sport: Option<String>,

        /// Move to this date (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,

        /// Move to this slot.
        #[arg(long)]
        new_slot: Option<u8>,

        #[arg(long)]
        duration_minutes: Option<u32>,

        /// JSON file with replacement steps; `-` reads stdin.
        #[arg(long)]
        steps: Option<PathBuf>,
    },

    /// Delete a workout remotely and drop its index entry.
    Delete {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Create the week plan's workouts for the days after `--from`.
    ApplyWeekPlan {
        /// Reference date (YYYY-MM-DD). Defaults to today.
        #[arg(long = "from")]
        from_date: Option<String>,

        /// Show what would be created without creating anything.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Which workout to act on: a remote id, or a scheduled date and slot.
#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Remote workout id.
    #[arg(long = "id", conflicts_with = "scheduled_date")]
    workout_id: Option<String>,

    /// Date of the index entry (YYYY-MM-DD).
    #[arg(long)]
    scheduled_date: Option<String>,

    /// Slot of the index entry.
    #[arg(long, requires = "scheduled_date")]
    slot: Option<u8>,
}

impl WorkoutCommand {
    /// The `manage_workout` arguments for this command.
    pub(super) fn to_args(&self) -> Result<Value, String> {
        let mut args = Map::new();
        let mut put = |key: &str, value: Value| {
            if !value.is_null() {
                args.insert(key.to_string(), value);
            }
        };

        match self {
            Self::Create {
                name,
                sport,
                description,
                date,
                slot,
                duration_minutes,
                steps,
            } => {
                put("action", json!("create"));
                put("name", json!(name));
                put("sport_type", json!(sport));
                put("description", json!(description));
                put("date", json!(date));
                put("slot", json!(slot));
                put("duration_minutes", json!(duration_minutes));
                put("steps", steps_arg(steps.as_ref())?);
            }
            Self::ListScheduled {
                start_date,
                end_date,
            } => {
                put("action", json!("list_scheduled"));
                put("start_date", json!(start_date));
                put("end_date", json!(end_date));
            }
            Self::ListLibrary {
                sport,
                start,
                limit,
            } => {
                put("action", json!("list_library"));
                put("sport_type", json!(sport));
                put("start", json!(start));
                put("limit", json!(limit));
            }
            Self::Update {
                target,
                name,
                description,
                sport,
                date,
                new_slot,
                duration_minutes,
                steps,
            } => {
                put("action", json!("update"));
                target.put_into(&mut put);
                put("name", json!(name));
                put("description", json!(description));
                put("sport_type", json!(sport));
                put("date", json!(date));
                put("new_slot", json!(new_slot));
                put("duration_minutes", json!(duration_minutes));
                put("steps", steps_arg(steps.as_ref())?);
            }
            Self::Delete { target } => {
                put("action", json!("delete"));
                target.put_into(&mut put);
            }
            Self::ApplyWeekPlan { from_date, dry_run } => {
                put("action", json!("apply_week_plan"));
                put("from_date", json!(from_date));
                put("dry_run", json!(dry_run));
            }
        }

        Ok(Value::Object(args))
    }
}

impl TargetArgs {
    fn put_into(&self, put: &mut impl FnMut(&str, Value)) {
        put("workout_id", json!(self.workout_id));
        put("scheduled_date", json!(self.scheduled_date));
        put("slot", json!(self.slot));
    }
}

fn steps_arg(path: Option<&PathBuf>) -> Result<Value, String> {
    let Some(path) = path else {
        return Ok(Value::Null);
    };
    let steps = read_json(path)?;
    if !steps.is_array() {
        return Err(format!("{} must hold a JSON array of steps", path.display()));
    }
    Ok(steps)
}
