//! Agent tools: JSON arguments in, a JSON result out.
//!
//! Every result carries `status`. Failures never escape as Rust errors; they
//! become `{"status": "error", "action", "kind", "error"}` objects.

pub mod activity;
pub mod health;
pub mod workout;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::manager::{ManagerError, WorkoutManager, parse_date};
use crate::remote::{FitnessService, RemoteError};
use crate::storage::ScheduleIndex;

pub const TOOLS: [&str; 3] = ["health_report", "manage_workout", "activity_query"];

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    Arguments(#[from] serde_json::Error),

    #[error("unknown action '{action}' (supported: {})", supported.join(", "))]
    UnknownAction {
        action: String,
        supported: &'static [&'static str],
    },

    #[error("unknown sections requested: {}", unknown.join(", "))]
    UnknownSections { unknown: Vec<String> },

    #[error(transparent)]
    Manager(#[from] ManagerError),
}

impl From<RemoteError> for ToolError {
    fn from(e: RemoteError) -> Self {
        Self::Manager(e.into())
    }
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool(_) => "unknown_tool",
            Self::UnknownAction { .. } => "unknown_action",
            Self::Arguments(_) | Self::UnknownSections { .. } => "validation",
            Self::Manager(e) => e.kind(),
        }
    }

    /// The error object reported for a failed call of `action`.
    pub fn to_response(&self, action: &str) -> Value {
        let mut response = json!({
            "status": "error",
            "action": action,
            "kind": self.kind(),
            "error": self.to_string(),
        });
        match self {
            Self::UnknownTool(_) => response["supportedTools"] = json!(TOOLS),
            Self::UnknownAction { supported, .. } => response["supportedActions"] = json!(supported),
            Self::UnknownSections { unknown } => {
                response["unknownSections"] = json!(unknown);
                response["validSections"] = json!(health::valid_sections());
            }
            Self::Arguments(_) | Self::Manager(_) => {}
        }
        response
    }
}

pub type Result<T> = core::result::Result<T, ToolError>;

/// Runs `tool` with JSON `args`. `Value::Null` args count as `{}`.
pub fn call<R: FitnessService, S: ScheduleIndex>(
    manager: &mut WorkoutManager<R, S>,
    tool: &str,
    args: Value,
) -> Value {
    let tool = tool.trim();
    let args = if args.is_null() { json!({}) } else { args };
    let action = match args.get("action").and_then(Value::as_str) {
        Some(action) => normalize_action(action),
        None => tool.to_string(),
    };

    tracing::debug!(tool, %action, "tool call");
    let outcome = match tool {
        "health_report" => health::report(manager.remote(), args),
        "manage_workout" => workout::manage(manager, args),
        "activity_query" => activity::query(manager.remote(), args),
        other => Err(ToolError::UnknownTool(other.to_string())),
    };

    outcome.unwrap_or_else(|e| {
        tracing::error!(tool, %action, kind = e.kind(), error = %e, "tool call failed");
        e.to_response(&action)
    })
}

/// Whether `response` reports a failure.
pub fn is_error(response: &Value) -> bool {
    response["status"] != "success"
}

/// `List-Scheduled` and `list_scheduled` name the same action.
fn normalize_action(action: &str) -> String {
    action.trim().to_lowercase().replace('-', "_")
}

/// Wraps a result body into a success response for `action`.
fn success(action: &str, body: impl Serialize) -> Result<Value> {
    let mut response = serde_json::to_value(body)?;
    if let Value::Object(fields) = &mut response {
        fields.insert("status".into(), json!("success"));
        fields.insert("action".into(), json!(action));
    }
    Ok(response)
}

/// Parses a `YYYY-MM-DD` argument that must be present.
fn required_date(field: &'static str, value: Option<&str>) -> Result<Date> {
    let value = value.ok_or(ManagerError::MissingField(field))?;
    Ok(parse_date(field, value)?)
}

/// Ids arrive as JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum IdArg {
    Number(u64),
    Text(String),
}

impl IdArg {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}
