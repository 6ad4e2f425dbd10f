//! Structured step input: what callers send before compilation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of caller-supplied step input.
///
/// A node is either a leaf step or a repeat group wrapping more nodes.
/// Field names follow the remote service's vocabulary, with aliases for the
/// shorter forms agents tend to write. Numeric fields stay as raw JSON values
/// so that `"12"` and `12` are both accepted and bad values can be reported
/// with their path. Nothing here is validated; the compiler does that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    /// Node kind: `workout_step` / `repeat_group` and their aliases.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    /// Step kind: warmup, interval, recovery, rest, cooldown.
    #[serde(alias = "kind", skip_serializing_if = "Option::is_none")]
    pub step_type: Option<String>,

    #[serde(alias = "note", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// End condition: time, reps, distance, lap button, ...
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_value: Option<Value>,

    /// Shorthand for `durationType: time`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<Value>,

    /// Shorthand for `durationType: reps`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Heart-rate zone number; implies a heart-rate target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_order: Option<Value>,

    #[serde(
        alias = "numberOfIterations",
        alias = "repeatIterations",
        alias = "repeatCount",
        skip_serializing_if = "Option::is_none"
    )]
    pub iterations: Option<Value>,

    #[serde(alias = "workoutSteps", skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepSpec>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_repeat: Option<bool>,
}

impl StepSpec {
    /// A leaf that ends after `seconds`.
    pub fn timed(step_type: &str, seconds: u32, description: &str) -> Self {
        Self {
            node_type: Some("workout_step".into()),
            step_type: Some(step_type.into()),
            description: Some(description.into()),
            duration_type: Some("time".into()),
            duration_value: Some(Value::from(seconds)),
            ..Self::default()
        }
    }

    /// An interval leaf that ends after `reps` repetitions.
    pub fn reps(reps: u32, description: &str) -> Self {
        Self {
            node_type: Some("workout_step".into()),
            step_type: Some("interval".into()),
            description: Some(description.into()),
            duration_type: Some("reps".into()),
            duration_value: Some(Value::from(reps)),
            ..Self::default()
        }
    }

    /// A repeat group running `steps` `iterations` times.
    pub fn repeat(iterations: i64, steps: Vec<StepSpec>) -> Self {
        Self {
            node_type: Some("repeat_group".into()),
            iterations: Some(Value::from(iterations)),
            steps: Some(steps),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_remote_style_aliases() {
        let json = r#"{
            "type": "RepeatGroupDTO",
            "numberOfIterations": 3,
            "workoutSteps": [
                {"kind": "work", "reps": "12", "note": "Squats"}
            ]
        }"#;
        let spec: StepSpec = serde_json::from_str(json).unwrap();

        assert_eq!(spec.node_type.as_deref(), Some("RepeatGroupDTO"));
        assert_eq!(spec.iterations, Some(Value::from(3)));
        let children = spec.steps.unwrap();
        assert_eq!(children[0].step_type.as_deref(), Some("work"));
        assert_eq!(children[0].reps, Some(Value::from("12")));
        assert_eq!(children[0].description.as_deref(), Some("Squats"));
    }

    #[test]
    fn omits_absent_fields_when_serialized() {
        let json = serde_json::to_value(StepSpec::reps(10, "Push-ups")).unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("iterations"));
        assert_eq!(object["durationType"], "reps");
    }
}
