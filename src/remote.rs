//! The remote fitness service, seen through an opaque client.
//!
//! Authentication, sessions and the HTTP API live outside this crate. The
//! [`FitnessService`] trait is the seam: production code talks to a bridge
//! process ([`BridgeClient`]), tests talk to an in-memory fake.

pub mod bridge;
#[cfg(test)]
pub mod fake;

pub use bridge::BridgeClient;

use jiff::civil::Date;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{Sport, SportTypeRef, UnknownSport, WorkoutPayload, WorkoutSegment};

/// A failure reported by, or on the way to, the remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("remote service rejected {operation}: {message}")]
    Rejected { operation: String, message: String },

    #[error("remote service has no {what} '{id}'")]
    NotFound { what: &'static str, id: String },

    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response to {operation}: {reason}")]
    Malformed { operation: String, reason: String },
}

pub type Result<T> = core::result::Result<T, RemoteError>;

/// The remote operations this crate needs.
///
/// Calls are blocking and never retried.
pub trait FitnessService {
    fn create_workout(&self, payload: &WorkoutPayload) -> Result<CreatedWorkout>;

    fn update_workout(&self, workout_id: &str, payload: &WorkoutPayload) -> Result<()>;

    fn delete_workout(&self, workout_id: &str) -> Result<()>;

    fn get_workout(&self, workout_id: &str) -> Result<RemoteWorkout>;

    /// Puts an existing workout on the calendar. Returns the raw response.
    fn schedule_workout(&self, workout_id: &str, date: Date) -> Result<Value>;

    /// One page of the workout library.
    fn list_library(&self, start: u32, limit: u32) -> Result<Vec<Value>>;

    fn get_activity(&self, activity_id: &str) -> Result<Value>;

    fn list_activities(&self, start: Date, end: Date) -> Result<Vec<Value>>;

    /// Raw data for one health section on one day. `Value::Null` when the
    /// service has nothing for that day.
    fn get_health_metrics(&self, date: Date, section: &str) -> Result<Value>;
}

/// The response to a create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedWorkout {
    #[serde(deserialize_with = "id_string")]
    pub workout_id: String,

    /// The sport the service actually persisted, when it says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_type_key: Option<String>,
}

/// A stored workout as the remote service returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWorkout {
    #[serde(deserialize_with = "id_string")]
    pub workout_id: String,

    #[serde(default)]
    pub workout_name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub sport_type: Option<SportTypeRef>,

    #[serde(default)]
    pub estimated_duration_in_secs: Option<u32>,

    #[serde(default)]
    pub workout_segments: Vec<WorkoutSegment>,
}

impl RemoteWorkout {
    /// The sport of the workout. A workout without a sport counts as
    /// strength; a sport key outside [`Sport`] is an error.
    pub fn sport(&self) -> core::result::Result<Sport, UnknownSport> {
        match &self.sport_type {
            None => Ok(Sport::Strength),
            Some(sport) => sport.sport_type_key.parse(),
        }
    }

    /// A payload carrying this workout's steps, ready for a PUT or a re-create.
    /// The stored sport is kept as is.
    pub fn to_payload(&self) -> WorkoutPayload {
        WorkoutPayload {
            workout_name: self.workout_name.clone(),
            description: self.description.clone().unwrap_or_default(),
            estimated_duration_in_secs: self.estimated_duration_in_secs.unwrap_or_default(),
            sport_type: self
                .sport_type
                .clone()
                .unwrap_or_else(|| Sport::Strength.type_ref()),
            workout_segments: self.workout_segments.clone(),
        }
    }
}

/// Remote ids arrive as numbers or strings; they are always handled as strings.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> core::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }

    match Id::deserialize(deserializer)? {
        Id::Number(n) => Ok(n.to_string()),
        Id::Text(s) if !s.trim().is_empty() => Ok(s),
        Id::Text(_) => Err(serde::de::Error::custom("empty workout id")),
    }
}
