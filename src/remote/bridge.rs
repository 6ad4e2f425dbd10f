//! Remote access through a bridge process.
//!
//! The bridge is any executable that speaks to the fitness service on our
//! behalf. Each call runs
//!
//! ```text
//! <program> <args..> <operation> [operands..]
//! ```
//!
//! with an optional JSON request body on stdin and the session path exported
//! as `COACH_SESSION_PATH`. The bridge prints a JSON response on stdout.
//! Exit codes: 0 success, 2 rejected (stderr holds the reason), 3 not found,
//! anything else unavailable.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::{Command, Stdio},
    thread,
};

use jiff::civil::Date;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{CreatedWorkout, FitnessService, RemoteError, RemoteWorkout, Result};
use crate::model::WorkoutPayload;

pub const SESSION_ENV: &str = "COACH_SESSION_PATH";

const EXIT_REJECTED: i32 = 2;
const EXIT_NOT_FOUND: i32 = 3;

/// A [`FitnessService`] backed by a bridge command.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    program: String,
    args: Vec<String>,
    session_path: Option<PathBuf>,
}

impl BridgeClient {
    /// A client for `command`, given as program followed by fixed arguments.
    pub fn new(command: &[String], session_path: Option<PathBuf>) -> core::result::Result<Self, String> {
        let (program, args) = command
            .split_first()
            .ok_or("remote command is empty; set [remote] command in the config or COACH_BRIDGE")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            session_path,
        })
    }

    /// Runs one operation and decodes its response.
    fn call<T: DeserializeOwned, B: Serialize>(
        &self,
        operation: &str,
        operands: &[&str],
        body: Option<&B>,
        what: &'static str,
    ) -> Result<T> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(operation)
            .args(operands)
            .stdin(if body.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = &self.session_path {
            command.env(SESSION_ENV, path);
        }

        tracing::debug!(program = %self.program, operation, ?operands, "calling bridge");

        let body = body
            .map(|body| {
                serde_json::to_vec(body).map_err(|e| RemoteError::Malformed {
                    operation: operation.to_string(),
                    reason: format!("could not encode request: {e}"),
                })
            })
            .transpose()?;

        let mut child = command
            .spawn()
            .map_err(|e| RemoteError::Unavailable(format!("failed to run {}: {e}", self.program)))?;

        // The body is written from its own thread while the output is drained,
        // so a bridge that answers before reading all of it cannot stall us.
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match (stdin, &body) {
                (Some(mut stdin), Some(json)) => stdin.write_all(json),
                _ => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("request writer panicked")));
            (output, written)
        });

        // A bridge that exits without reading its input is judged by its exit
        // code, not by the broken pipe.
        match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(RemoteError::Unavailable(format!(
                    "failed to send request to {}: {e}",
                    self.program
                )));
            }
            _ => {}
        }
        let output =
            output.map_err(|e| RemoteError::Unavailable(format!("bridge did not finish: {e}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(0) => {}
            Some(EXIT_REJECTED) => {
                return Err(RemoteError::Rejected {
                    operation: operation.to_string(),
                    message: stderr,
                });
            }
            Some(EXIT_NOT_FOUND) => {
                return Err(RemoteError::NotFound {
                    what,
                    id: operands.first().copied().unwrap_or_default().to_string(),
                });
            }
            code => {
                let status = code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
                return Err(RemoteError::Unavailable(format!(
                    "{operation} exited with {status}: {stderr}"
                )));
            }
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value = if stdout.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&stdout).map_err(|e| RemoteError::Malformed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?
        };
        serde_json::from_value(value).map_err(|e| RemoteError::Malformed {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Library and activity listings come either as a bare array or wrapped in an
/// object under `key`.
fn unwrap_list(value: Value, key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
    .into_iter()
    .filter(Value::is_object)
    .collect()
}

const NO_BODY: Option<&()> = None;

impl FitnessService for BridgeClient {
    fn create_workout(&self, payload: &WorkoutPayload) -> Result<CreatedWorkout> {
        self.call("create-workout", &[], Some(payload), "workout")
    }

    fn update_workout(&self, workout_id: &str, payload: &WorkoutPayload) -> Result<()> {
        self.call::<Value, _>("update-workout", &[workout_id], Some(payload), "workout")
            .map(drop)
    }

    fn delete_workout(&self, workout_id: &str) -> Result<()> {
        self.call::<Value, _>("delete-workout", &[workout_id], NO_BODY, "workout")
            .map(drop)
    }

    fn get_workout(&self, workout_id: &str) -> Result<RemoteWorkout> {
        self.call("get-workout", &[workout_id], NO_BODY, "workout")
    }

    fn schedule_workout(&self, workout_id: &str, date: Date) -> Result<Value> {
        let date = date.to_string();
        self.call("schedule-workout", &[workout_id, date.as_str()], NO_BODY, "workout")
    }

    fn list_library(&self, start: u32, limit: u32) -> Result<Vec<Value>> {
        let (start, limit) = (start.to_string(), limit.to_string());
        let value: Value = self.call("list-workouts", &[start.as_str(), limit.as_str()], NO_BODY, "workout")?;
        Ok(unwrap_list(value, "workouts"))
    }

    fn get_activity(&self, activity_id: &str) -> Result<Value> {
        self.call("get-activity", &[activity_id], NO_BODY, "activity")
    }

    fn list_activities(&self, start: Date, end: Date) -> Result<Vec<Value>> {
        let (start, end) = (start.to_string(), end.to_string());
        let value: Value = self.call("list-activities", &[start.as_str(), end.as_str()], NO_BODY, "activity")?;
        Ok(unwrap_list(value, "activities"))
    }

    fn get_health_metrics(&self, date: Date, section: &str) -> Result<Value> {
        let date = date.to_string();
        self.call("health", &[date.as_str(), section], NO_BODY, "health section")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    use std::fs;

    use jiff::civil::date;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    /// A client running `script` through `sh -c`. Inside the script `$1` is
    /// the operation and `$2..` the operands.
    fn script_client(script: &str) -> BridgeClient {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "bridge".to_string(),
        ];
        BridgeClient::new(&command, None).unwrap()
    }

    fn sample_payload() -> WorkoutPayload {
        WorkoutPayload::single_segment(
            "Legs",
            "Squats",
            crate::model::Sport::Strength,
            600,
            vec![],
        )
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(BridgeClient::new(&[], None).is_err());
    }

    #[test]
    fn create_sends_payload_on_stdin() {
        let dir = TempDir::new().unwrap();
        let captured = dir.path().join("request.json");
        let client = script_client(&format!(
            r#"cat > '{}'; echo '{{"workoutId": 42, "sportTypeKey": "strength_training"}}'"#,
            captured.display()
        ));

        let created = client.create_workout(&sample_payload()).unwrap();

        assert_eq!(created.workout_id, "42");
        assert_eq!(created.sport_type_key.as_deref(), Some("strength_training"));
        let request: Value = serde_json::from_str(&fs::read_to_string(captured).unwrap()).unwrap();
        assert_eq!(request["workoutName"], "Legs");
    }

    #[test]
    fn large_request_and_response_do_not_stall() {
        // Answers in full before reading any of its input.
        let client = script_client(
            r#"printf '{"pad": "'; head -c 200000 /dev/zero | tr '\0' a; printf '"}'; cat > /dev/null"#,
        );
        let mut payload = sample_payload();
        payload.description = "x".repeat(200_000);

        assert_eq!(client.update_workout("77", &payload), Ok(()));
    }

    #[test]
    fn operation_and_operands_are_passed() {
        let client = script_client(r#"printf '{"op": "%s", "id": "%s", "date": "%s"}' "$1" "$2" "$3""#);
        let response = client.schedule_workout("77", date(2026, 2, 16)).unwrap();
        assert_eq!(
            response,
            json!({"op": "schedule-workout", "id": "77", "date": "2026-02-16"})
        );
    }

    #[test]
    fn session_path_is_exported() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            r#"printf '"%s"' "$COACH_SESSION_PATH""#.to_string(),
            "bridge".to_string(),
        ];
        let client = BridgeClient::new(&command, Some(PathBuf::from("/tmp/session"))).unwrap();
        assert_eq!(client.get_activity("1").unwrap(), json!("/tmp/session"));
    }

    #[test]
    fn exit_codes_map_to_errors() {
        let rejected = script_client("echo 'bad payload' >&2; exit 2");
        assert_eq!(
            rejected.delete_workout("9").unwrap_err(),
            RemoteError::Rejected {
                operation: "delete-workout".into(),
                message: "bad payload".into(),
            }
        );

        let missing = script_client("exit 3");
        assert_eq!(
            missing.get_workout("9").unwrap_err(),
            RemoteError::NotFound {
                what: "workout",
                id: "9".into(),
            }
        );

        let broken = script_client("exit 1");
        assert!(matches!(
            broken.delete_workout("9").unwrap_err(),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let client =
            BridgeClient::new(&["/nonexistent/coach-bridge".to_string()], None).unwrap();
        assert!(matches!(
            client.delete_workout("1").unwrap_err(),
            RemoteError::Unavailable(_)
        ));
    }

    #[test]
    fn garbage_output_is_malformed() {
        let client = script_client("echo 'not json'");
        assert!(matches!(
            client.get_workout("1").unwrap_err(),
            RemoteError::Malformed { .. }
        ));
    }

    #[test]
    fn listings_accept_wrapped_arrays() {
        let client = script_client(r#"echo '{"workouts": [{"workoutId": 1}, 5]}'"#);
        let items = client.list_library(0, 10).unwrap();
        assert_eq!(items, vec![json!({"workoutId": 1})]);
    }

    #[test]
    fn empty_output_is_unit() {
        let client = script_client("exit 0");
        client.delete_workout("1").unwrap();
    }
}
