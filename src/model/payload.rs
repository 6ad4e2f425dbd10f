//! Workout payload: the full document submitted to the remote service.

use serde::{Deserialize, Serialize};

use super::{CompiledStep, Sport, SportTypeRef};

/// A complete workout as the remote service accepts it on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPayload {
    pub workout_name: String,
    pub description: String,
    pub estimated_duration_in_secs: u32,
    pub sport_type: SportTypeRef,
    pub workout_segments: Vec<WorkoutSegment>,
}

/// A segment of a workout. Payloads built here always carry exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSegment {
    pub segment_order: u32,
    pub sport_type: SportTypeRef,
    pub workout_steps: Vec<CompiledStep>,
}

impl WorkoutPayload {
    /// Builds a single-segment payload for `sport`.
    pub fn single_segment(
        name: &str,
        description: &str,
        sport: Sport,
        estimated_seconds: u32,
        steps: Vec<CompiledStep>,
    ) -> Self {
        Self {
            workout_name: name.to_string(),
            description: description.to_string(),
            estimated_duration_in_secs: estimated_seconds,
            sport_type: sport.type_ref(),
            workout_segments: vec![WorkoutSegment {
                segment_order: 1,
                sport_type: sport.type_ref(),
                workout_steps: steps,
            }],
        }
    }

    /// The steps of the first segment.
    pub fn steps(&self) -> &[CompiledStep] {
        self.workout_segments
            .first()
            .map(|segment| segment.workout_steps.as_slice())
            .unwrap_or_default()
    }

    /// Sets the sport on the payload and on every segment.
    pub fn apply_sport(&mut self, sport: Sport) {
        self.sport_type = sport.type_ref();
        for segment in &mut self.workout_segments {
            segment.sport_type = sport.type_ref();
        }
    }
}
