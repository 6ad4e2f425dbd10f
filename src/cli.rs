//! CLI interface for Coach.
//!
//! Designed for agents first: every subcommand maps onto one of the agent
//! tools and prints that tool's JSON result on stdout. Logs go to stderr.
//! An error result still prints its JSON, then exits non-zero.
//!
//! - `coach health <day>` — the `health_report` tool.
//! - `coach workout <action>` — the `manage_workout` tool.
//! - `coach activity <action>` — the `activity_query` tool.
//! - `coach call <tool> [json]` — any tool with raw JSON arguments.

mod workout;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};

use crate::config::Config;
use crate::manager::WorkoutManager;
use crate::remote::BridgeClient;
use crate::storage::FileIndex;
use crate::tools;

use workout::WorkoutCommand;

/// Coach — workouts, activities and health data for agents.
#[derive(Debug, Parser)]
#[command(name = "coach", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Config file. Defaults to `~/.coach/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log more on stderr: `-v` info, `-vv` debug, `-vvv` trace.
    /// `COACH_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Pretty-print the JSON result.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: planning a training week
  1. coach health 2026-02-15
     → sleep, stress, body battery and readiness for the day
  2. coach workout apply-week-plan --from 2026-02-15 --dry-run
  3. coach workout apply-week-plan --from 2026-02-15
  4. coach workout list-scheduled 2026-02-16 2026-02-22

Structured steps:
  coach workout create "Leg day" --date 2026-02-17 --steps steps.json
  where steps.json holds e.g.
  [{"stepType": "warmup", "seconds": 300},
   {"repeatCount": 3, "steps": [{"reps": 12, "description": "Squats"},
                                {"stepType": "rest", "seconds": 60}]}]

Raw tool calls:
  coach call activity_query '{"action": "list", "from_date": "2026-02-01", "to_date": "2026-02-28"}'"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Health report for one day.
    Health {
        /// Day to report on (YYYY-MM-DD).
        day: String,

        /// `summary` queries fewer sections; `full` adds steps, floors,
        /// heart rates, SpO2, respiration, hydration and HRV.
        #[arg(long, value_enum, default_value_t = ModeArg::Summary)]
        mode: ModeArg,

        /// Query only these sections. Can be specified multiple times.
        #[arg(long = "section")]
        sections: Vec<String>,

        /// Include each section's raw data.
        #[arg(long)]
        include_raw: bool,
    },

    /// Create, list, update and delete workouts.
    Workout {
        #[command(subcommand)]
        command: WorkoutCommand,
    },

    /// Recorded activities.
    Activity {
        #[command(subcommand)]
        command: ActivityCommand,
    },

    /// Call a tool with JSON arguments.
    Call {
        /// health_report, manage_workout or activity_query.
        tool: String,

        /// JSON object of arguments; `-` reads stdin. Defaults to `{}`.
        args: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Summary,
    Full,
}

#[derive(Debug, Subcommand)]
pub enum ActivityCommand {
    /// Activities within a date range.
    List {
        /// First date (YYYY-MM-DD).
        #[arg(long = "from")]
        from_date: String,

        /// Last date (YYYY-MM-DD).
        #[arg(long = "to")]
        to_date: String,

        /// At most this many activities, 1 to 200.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// One activity in detail.
    Detail {
        /// Activity id.
        id: String,
    },
}

/// Run a parsed command, returning an error message on failure.
pub fn run(cli: &Cli, config: &Config) -> Result<(), String> {
    let (tool, args) = tool_call(&cli.command)?;

    let response = match open_manager(config) {
        Ok(mut manager) => tools::call(&mut manager, &tool, args),
        Err(e) => json!({
            "status": "error",
            "action": tool,
            "kind": "configuration",
            "error": e,
        }),
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .map_err(|e| format!("failed to serialize result: {e}"))?;
    println!("{json}");

    if tools::is_error(&response) {
        let message = response["error"].as_str().unwrap_or("tool call failed");
        return Err(format!("{tool}: {message}"));
    }
    Ok(())
}

fn open_manager(config: &Config) -> Result<WorkoutManager<BridgeClient, FileIndex>, String> {
    let remote = BridgeClient::new(&config.remote.command, config.session_path.clone())?;
    let index_path = config
        .index_path()
        .ok_or("could not determine home directory")?;
    tracing::debug!(index = %index_path.display(), "opening index");
    Ok(WorkoutManager::new(
        remote,
        FileIndex::new(index_path),
        config.manager_settings(),
    ))
}

/// The tool name and JSON arguments a command stands for.
fn tool_call(command: &Command) -> Result<(String, Value), String> {
    let call = match command {
        Command::Health {
            day,
            mode,
            sections,
            include_raw,
        } => {
            let mode = match mode {
                ModeArg::Summary => "summary",
                ModeArg::Full => "full",
            };
            let mut args = json!({"day": day, "mode": mode, "include_raw": include_raw});
            if !sections.is_empty() {
                args["sections"] = json!(sections);
            }
            ("health_report".to_string(), args)
        }
        Command::Workout { command } => ("manage_workout".to_string(), command.to_args()?),
        Command::Activity { command } => {
            let args = match command {
                ActivityCommand::List {
                    from_date,
                    to_date,
                    limit,
                } => {
                    let mut args =
                        json!({"action": "list", "from_date": from_date, "to_date": to_date});
                    if let Some(limit) = limit {
                        args["limit"] = json!(limit);
                    }
                    args
                }
                ActivityCommand::Detail { id } => json!({"action": "detail", "activity_id": id}),
            };
            ("activity_query".to_string(), args)
        }
        Command::Call { tool, args } => {
            let args = match args.as_deref() {
                None => Value::Null,
                Some("-") => read_json(Path::new("-"))?,
                Some(text) => serde_json::from_str(text)
                    .map_err(|e| format!("arguments are not valid JSON: {e}"))?,
            };
            (tool.clone(), args)
        }
    };
    Ok(call)
}

/// Reads JSON from `path`, or from stdin when `path` is `-`.
fn read_json(path: &Path) -> Result<Value, String> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        text
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?
    };
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in {}: {e}", path.display()))
}
