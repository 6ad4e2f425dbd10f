//! Recorded activities: list by date range, or one in detail.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{IdArg, Result, ToolError, normalize_action, required_date, success};
use crate::manager::ManagerError;
use crate::remote::FitnessService;

pub const ACTIONS: [&str; 2] = ["list", "detail"];

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ActivityArgs {
    action: Option<String>,

    #[serde(default)]
    from_date: Option<String>,

    #[serde(default)]
    to_date: Option<String>,

    #[serde(default)]
    activity_id: Option<IdArg>,

    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityList {
    pub from_date: Date,
    pub to_date: Date,
    pub count: usize,
    pub activities: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetail {
    pub activity_id: String,
    pub activity: Value,
}

/// The `activity_query` tool.
pub fn query<R: FitnessService>(remote: &R, args: Value) -> Result<Value> {
    let args: ActivityArgs = serde_json::from_value(args)?;
    let action = args
        .action
        .as_deref()
        .map(normalize_action)
        .ok_or(ManagerError::MissingField("action"))?;

    match action.as_str() {
        "list" => {
            let from = required_date("from_date", args.from_date.as_deref())?;
            let to = required_date("to_date", args.to_date.as_deref())?;
            let listing = list(remote, from, to, args.limit.unwrap_or(DEFAULT_LIMIT))?;
            success("list", listing)
        }
        "detail" => {
            let id = args
                .activity_id
                .map(IdArg::into_string)
                .filter(|id| !id.is_empty())
                .ok_or(ManagerError::MissingField("activity_id"))?;
            let activity = remote.get_activity(&id)?;
            success(
                "detail",
                ActivityDetail {
                    activity_id: id,
                    activity,
                },
            )
        }
        _ => Err(ToolError::UnknownAction {
            action,
            supported: &ACTIONS,
        }),
    }
}

/// Activities between `from` and `to`, at most `limit` (bounded to
/// `1..=200`) of them.
pub fn list<R: FitnessService>(remote: &R, from: Date, to: Date, limit: i64) -> Result<ActivityList> {
    if from > to {
        return Err(ManagerError::Validation("from_date must not be after to_date".into()).into());
    }
    let limit = usize::try_from(limit.clamp(1, MAX_LIMIT)).unwrap_or(1);

    let mut activities = remote.list_activities(from, to)?;
    activities.truncate(limit);
    Ok(ActivityList {
        from_date: from,
        to_date: to,
        count: activities.len(),
        activities,
    })
}
