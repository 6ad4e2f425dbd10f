//! In-memory fitness service for tests.

use std::{cell::RefCell, collections::BTreeMap};

use jiff::civil::Date;
use serde_json::{Value, json};

use super::{CreatedWorkout, FitnessService, RemoteError, RemoteWorkout, Result};
use crate::model::WorkoutPayload;

#[derive(Debug, Default)]
pub struct FakeState {
    pub workouts: BTreeMap<String, RemoteWorkout>,
    pub scheduled: Vec<(String, Date)>,
    pub library: Vec<Value>,
    pub activities: Vec<Value>,
    pub health: BTreeMap<String, Value>,
    pub calls: Vec<String>,
    next_id: u64,
}

/// Records every call; operations listed in `failing` fail with the given error.
#[derive(Debug, Default)]
pub struct FakeService {
    pub state: RefCell<FakeState>,
    failing: RefCell<BTreeMap<&'static str, RemoteError>>,

    /// Sport key reported back on create, overriding the payload's.
    pub persisted_sport: RefCell<Option<String>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, operation: &'static str, error: RemoteError) {
        self.failing.borrow_mut().insert(operation, error);
    }

    /// Stores a workout directly, as if created earlier.
    pub fn insert(&self, payload: &WorkoutPayload) -> String {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = (1000 + state.next_id).to_string();
        state.workouts.insert(id.clone(), stored(&id, payload));
        id
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn workout(&self, id: &str) -> Option<RemoteWorkout> {
        self.state.borrow().workouts.get(id).cloned()
    }

    fn enter(&self, operation: &'static str) -> Result<()> {
        self.state.borrow_mut().calls.push(operation.to_string());
        match self.failing.borrow().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn stored(id: &str, payload: &WorkoutPayload) -> RemoteWorkout {
    RemoteWorkout {
        workout_id: id.to_string(),
        workout_name: payload.workout_name.clone(),
        description: Some(payload.description.clone()),
        sport_type: Some(payload.sport_type.clone()),
        estimated_duration_in_secs: Some(payload.estimated_duration_in_secs),
        workout_segments: payload.workout_segments.clone(),
    }
}

fn not_found(id: &str) -> RemoteError {
    RemoteError::NotFound {
        what: "workout",
        id: id.to_string(),
    }
}

impl FitnessService for FakeService {
    fn create_workout(&self, payload: &WorkoutPayload) -> Result<CreatedWorkout> {
        self.enter("create")?;
        let id = self.insert(payload);
        let persisted = self.persisted_sport.borrow().clone();
        if let Some(key) = &persisted {
            let sport = key.parse::<crate::model::Sport>().ok().map(|s| s.type_ref());
            if let Some(workout) = self.state.borrow_mut().workouts.get_mut(&id) {
                workout.sport_type = sport;
            }
        }
        Ok(CreatedWorkout {
            workout_id: id,
            sport_type_key: persisted.or_else(|| Some(payload.sport_type.sport_type_key.clone())),
        })
    }

    fn update_workout(&self, workout_id: &str, payload: &WorkoutPayload) -> Result<()> {
        self.enter("update")?;
        let mut state = self.state.borrow_mut();
        let slot = state
            .workouts
            .get_mut(workout_id)
            .ok_or_else(|| not_found(workout_id))?;
        *slot = stored(workout_id, payload);
        Ok(())
    }

    fn delete_workout(&self, workout_id: &str) -> Result<()> {
        self.enter("delete")?;
        let mut state = self.state.borrow_mut();
        state
            .workouts
            .remove(workout_id)
            .ok_or_else(|| not_found(workout_id))?;
        state.scheduled.retain(|(id, _)| id != workout_id);
        Ok(())
    }

    fn get_workout(&self, workout_id: &str) -> Result<RemoteWorkout> {
        self.enter("get")?;
        self.workout(workout_id).ok_or_else(|| not_found(workout_id))
    }

    fn schedule_workout(&self, workout_id: &str, date: Date) -> Result<Value> {
        self.enter("schedule")?;
        let mut state = self.state.borrow_mut();
        if !state.workouts.contains_key(workout_id) {
            return Err(not_found(workout_id));
        }
        state.scheduled.push((workout_id.to_string(), date));
        Ok(json!({"workoutScheduleId": state.scheduled.len(), "calendarDate": date.to_string()}))
    }

    fn list_library(&self, start: u32, limit: u32) -> Result<Vec<Value>> {
        self.enter("list_library")?;
        let state = self.state.borrow();
        Ok(state
            .library
            .iter()
            .skip(start as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn get_activity(&self, activity_id: &str) -> Result<Value> {
        self.enter("get_activity")?;
        self.state
            .borrow()
            .activities
            .iter()
            .find(|activity| activity["activityId"].to_string().trim_matches('"') == activity_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                what: "activity",
                id: activity_id.to_string(),
            })
    }

    fn list_activities(&self, _start: Date, _end: Date) -> Result<Vec<Value>> {
        self.enter("list_activities")?;
        Ok(self.state.borrow().activities.clone())
    }

    fn get_health_metrics(&self, _date: Date, section: &str) -> Result<Value> {
        self.enter("health")?;
        Ok(self
            .state
            .borrow()
            .health
            .get(section)
            .cloned()
            .unwrap_or(Value::Null))
    }
}
