//! Step compiler: structured step input to the remote nested step payload.
//!
//! Takes a list of [`StepSpec`] nodes (leaf steps and repeat groups, nested to
//! any depth up to [`MAX_NESTING_DEPTH`]) and produces the compiled
//! [`CompiledStep`] tree plus an advisory duration estimate. The remote service
//! computes its own duration once the workout is stored.
//!
//! Pure: no I/O, no clock.

pub mod shorthand;
pub mod tables;

use serde_json::Value;

use crate::model::{CompiledStep, ExecutableStep, RepeatGroupStep, StepSpec};

use tables::{Condition, NodeKind, StepKind, Target, normalize_token};

/// Repeat groups may nest at most this many levels.
pub const MAX_NESTING_DEPTH: usize = 5;

/// Seconds assumed per repetition when estimating rep-based steps.
pub const SECONDS_PER_REP: f64 = 3.0;

/// Seconds assumed for a step that ends on a lap-button press.
pub const LAP_BUTTON_SECONDS: f64 = 90.0;

/// A step specification that cannot be compiled.
///
/// Every variant names the path of the offending node, e.g. `steps[1].steps[0]`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("{path} must be a non-empty list of steps")]
    EmptySteps { path: String },

    #[error("{path}.type '{value}' must be one of: repeat_group, workout_step")]
    InvalidNodeType { path: String, value: String },

    #[error("{path}.stepType '{value}' must be one of: {}", StepKind::ALLOWED)]
    InvalidStepKind { path: String, value: String },

    #[error("{path}.durationType '{value}' must be one of: {}", Condition::ALLOWED)]
    InvalidDurationType { path: String, value: String },

    #[error("{path}.targetType '{value}' is not supported (expected one of: {}, or zone 1-5)", Target::ALLOWED)]
    InvalidTarget { path: String, value: String },

    #[error("{path} has no duration: set durationType and durationValue, seconds, or reps")]
    MissingDuration { path: String },

    #[error("{path} sets more than one duration ({sources})")]
    AmbiguousDuration { path: String, sources: String },

    #[error("{path}.{field} must be a positive number, got {value}")]
    InvalidNumber {
        path: String,
        field: &'static str,
        value: String,
    },

    #[error("{path}.iterations must be >= 1, got {value}")]
    InvalidRepeatCount { path: String, value: i64 },

    #[error("{path} nests repeat groups deeper than {max} levels")]
    NestingTooDeep { path: String, max: usize },
}

pub type Result<T> = core::result::Result<T, CompileError>;

/// Output of [`compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSteps {
    pub steps: Vec<CompiledStep>,
    pub estimated_seconds: f64,
}

impl CompiledSteps {
    /// The estimate rounded to whole seconds.
    pub fn estimated_whole_seconds(&self) -> u32 {
        self.estimated_seconds.round().max(0.0) as u32
    }

    /// Number of leaf steps and repeat groups in the tree, not multiplied out.
    pub fn counts(&self) -> (usize, usize) {
        fn walk(steps: &[CompiledStep], leaves: &mut usize, groups: &mut usize) {
            for step in steps {
                match step {
                    CompiledStep::Executable(_) => *leaves += 1,
                    CompiledStep::RepeatGroup(group) => {
                        *groups += 1;
                        walk(&group.workout_steps, leaves, groups);
                    }
                }
            }
        }
        let (mut leaves, mut groups) = (0, 0);
        walk(&self.steps, &mut leaves, &mut groups);
        (leaves, groups)
    }
}

/// Compiles a list of step nodes.
pub fn compile(steps: &[StepSpec]) -> Result<CompiledSteps> {
    let steps = compile_list(steps, "steps", 0)?;
    let estimated_seconds = steps.iter().map(estimate_seconds).sum();
    Ok(CompiledSteps {
        steps,
        estimated_seconds,
    })
}

/// Estimated seconds for one compiled node.
///
/// Groups contribute `iterations × child subtotal`.
pub fn estimate_seconds(step: &CompiledStep) -> f64 {
    match step {
        CompiledStep::RepeatGroup(group) => {
            let per_iteration: f64 = group.workout_steps.iter().map(estimate_seconds).sum();
            per_iteration * f64::from(group.number_of_iterations.max(1))
        }
        CompiledStep::Executable(step) => {
            match (
                step.end_condition.condition_type_key.as_str(),
                step.end_condition_value,
            ) {
                ("time", Some(seconds)) => seconds.max(0.0),
                ("iterations", None) => LAP_BUTTON_SECONDS,
                ("iterations", Some(reps)) => {
                    reps * side_multiplier(&step.description) * SECONDS_PER_REP
                }
                _ => 0.0,
            }
        }
    }
}

/// Unilateral exercises take twice as long: "8/leg lunges".
fn side_multiplier(description: &str) -> f64 {
    let lower = description.to_lowercase();
    let unilateral = ["/leg", "per leg", "/side", "per side", "/cama", "per cama"]
        .iter()
        .any(|marker| lower.contains(marker));
    if unilateral { 2.0 } else { 1.0 }
}

fn compile_list(nodes: &[StepSpec], path: &str, depth: usize) -> Result<Vec<CompiledStep>> {
    if nodes.is_empty() {
        return Err(CompileError::EmptySteps {
            path: path.to_string(),
        });
    }

    nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let node_path = format!("{path}[{index}]");
            let fallback_order = u32::try_from(index + 1).unwrap_or(u32::MAX);
            match classify(node, &node_path)? {
                NodeKind::Step => compile_leaf(node, fallback_order, &node_path),
                NodeKind::RepeatGroup => compile_group(node, fallback_order, &node_path, depth + 1),
            }
        })
        .collect()
}

/// Decides whether a node is a leaf or a group.
///
/// Explicit `type` wins, then a repeat `stepType`, then the presence of both
/// an iteration count and children.
fn classify(node: &StepSpec, path: &str) -> Result<NodeKind> {
    let repeat_step_type = node
        .step_type
        .as_deref()
        .is_some_and(NodeKind::is_repeat_step_type);

    if let Some(raw) = node.node_type.as_deref() {
        let kind = NodeKind::from_alias(raw).ok_or_else(|| CompileError::InvalidNodeType {
            path: path.to_string(),
            value: raw.to_string(),
        })?;
        if kind == NodeKind::Step && repeat_step_type {
            return Ok(NodeKind::RepeatGroup);
        }
        return Ok(kind);
    }

    if repeat_step_type || (node.iterations.is_some() && node.steps.is_some()) {
        Ok(NodeKind::RepeatGroup)
    } else {
        Ok(NodeKind::Step)
    }
}

fn compile_group(
    node: &StepSpec,
    fallback_order: u32,
    path: &str,
    depth: usize,
) -> Result<CompiledStep> {
    if depth > MAX_NESTING_DEPTH {
        return Err(CompileError::NestingTooDeep {
            path: path.to_string(),
            max: MAX_NESTING_DEPTH,
        });
    }

    let iterations = parse_repeat_count(node.iterations.as_ref(), path)?;
    let children = node.steps.as_deref().unwrap_or_default();
    let workout_steps = compile_list(children, &format!("{path}.steps"), depth)?;

    Ok(CompiledStep::RepeatGroup(RepeatGroupStep {
        step_order: resolve_step_order(node, fallback_order, path)?,
        step_type: StepKind::Repeat.type_ref(),
        number_of_iterations: iterations,
        workout_steps,
        end_condition: Condition::repeat_end_condition(),
        end_condition_value: f64::from(iterations),
        smart_repeat: node.smart_repeat.unwrap_or(false),
    }))
}

fn compile_leaf(node: &StepSpec, fallback_order: u32, path: &str) -> Result<CompiledStep> {
    let (condition, value) = resolve_duration(node, path)?;
    let (target, zone_number) = resolve_target(node, path)?;

    let description = node
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let kind = match node.step_type.as_deref() {
        Some(raw) => StepKind::from_alias(raw).ok_or_else(|| CompileError::InvalidStepKind {
            path: path.to_string(),
            value: raw.to_string(),
        })?,
        None if description.is_some_and(mentions_rest) => StepKind::Rest,
        None => StepKind::Interval,
    };

    Ok(CompiledStep::Executable(ExecutableStep {
        step_order: resolve_step_order(node, fallback_order, path)?,
        description: description
            .unwrap_or_else(|| kind.default_description())
            .to_string(),
        step_type: kind.type_ref(),
        end_condition: condition.end_condition(),
        end_condition_value: value,
        target_type: target.type_ref(),
        zone_number,
    }))
}

pub(crate) fn mentions_rest(description: &str) -> bool {
    let token = normalize_token(description);
    token.contains("rest") || token.contains("descans")
}

/// Picks the single duration source of a leaf and parses its value.
fn resolve_duration(node: &StepSpec, path: &str) -> Result<(Condition, Option<f64>)> {
    let mut sources = Vec::new();
    if node.duration_type.is_some() || node.duration_value.is_some() {
        sources.push("durationType");
    }
    if node.seconds.is_some() {
        sources.push("seconds");
    }
    if node.reps.is_some() {
        sources.push("reps");
    }
    if sources.len() > 1 {
        return Err(CompileError::AmbiguousDuration {
            path: path.to_string(),
            sources: sources.join(", "),
        });
    }

    if let Some(seconds) = &node.seconds {
        let value = parse_positive(Some(seconds), path, "seconds")?;
        return Ok((Condition::Time, Some(value)));
    }
    if let Some(reps) = &node.reps {
        let value = parse_positive(Some(reps), path, "reps")?;
        return Ok((Condition::Iterations, Some(value)));
    }

    let Some(raw) = node.duration_type.as_deref() else {
        return Err(CompileError::MissingDuration {
            path: path.to_string(),
        });
    };
    let condition =
        Condition::from_alias(raw).ok_or_else(|| CompileError::InvalidDurationType {
            path: path.to_string(),
            value: raw.to_string(),
        })?;
    if !condition.takes_value() {
        return Ok((condition, None));
    }
    let value = parse_positive(node.duration_value.as_ref(), path, "durationValue")?;
    Ok((condition, Some(value)))
}

fn resolve_target(node: &StepSpec, path: &str) -> Result<(Target, Option<u8>)> {
    let target = match node.target_type.as_deref() {
        Some(raw) => Target::from_alias(raw).ok_or_else(|| CompileError::InvalidTarget {
            path: path.to_string(),
            value: raw.to_string(),
        })?,
        None if node.zone.is_some() => Target::HeartRate,
        None => Target::NoTarget,
    };

    let Some(raw_zone) = &node.zone else {
        return Ok((target, None));
    };
    let zone = as_integer(raw_zone)
        .and_then(|z| u8::try_from(z).ok())
        .filter(|z| Target::ZONES.contains(z));
    match (target, zone) {
        (Target::HeartRate, Some(zone)) => Ok((target, Some(zone))),
        _ => Err(CompileError::InvalidTarget {
            path: path.to_string(),
            value: format!("zone {raw_zone}"),
        }),
    }
}

fn resolve_step_order(node: &StepSpec, fallback: u32, path: &str) -> Result<u32> {
    let Some(raw) = &node.step_order else {
        return Ok(fallback);
    };
    as_integer(raw)
        .filter(|order| *order >= 1)
        .and_then(|order| u32::try_from(order).ok())
        .ok_or_else(|| CompileError::InvalidNumber {
            path: path.to_string(),
            field: "stepOrder",
            value: raw.to_string(),
        })
}

fn parse_repeat_count(raw: Option<&Value>, path: &str) -> Result<u32> {
    let Some(raw) = raw else {
        return Err(CompileError::InvalidNumber {
            path: path.to_string(),
            field: "iterations",
            value: "null".to_string(),
        });
    };
    let count = as_integer(raw).ok_or_else(|| CompileError::InvalidNumber {
        path: path.to_string(),
        field: "iterations",
        value: raw.to_string(),
    })?;
    if count < 1 {
        return Err(CompileError::InvalidRepeatCount {
            path: path.to_string(),
            value: count,
        });
    }
    u32::try_from(count).map_err(|_| CompileError::InvalidNumber {
        path: path.to_string(),
        field: "iterations",
        value: raw.to_string(),
    })
}

fn parse_positive(raw: Option<&Value>, path: &str, field: &'static str) -> Result<f64> {
    let invalid = || CompileError::InvalidNumber {
        path: path.to_string(),
        field,
        value: raw.map_or_else(|| "null".to_string(), Value::to_string),
    };
    let value = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid())
    }
}

/// Integers given as JSON numbers (`3`, `3.0`) or strings (`"3"`).
fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn specs(value: Value) -> Vec<StepSpec> {
        serde_json::from_value(value).unwrap()
    }

    fn executable(step: &CompiledStep) -> &ExecutableStep {
        match step {
            CompiledStep::Executable(step) => step,
            CompiledStep::RepeatGroup(_) => panic!("expected an executable step"),
        }
    }

    fn group(step: &CompiledStep) -> &RepeatGroupStep {
        match step {
            CompiledStep::RepeatGroup(group) => group,
            CompiledStep::Executable(_) => panic!("expected a repeat group"),
        }
    }

    #[test]
    fn maps_reps_and_time_steps() {
        let compiled = compile(&specs(json!([
            {"type": "workout_step", "stepOrder": 1, "durationType": "reps",
             "durationValue": 12, "targetType": "no_target", "description": "Squat"},
            {"type": "workout_step", "stepOrder": 2, "durationType": "time",
             "durationValue": 60, "description": "Rest"}
        ])))
        .unwrap();

        let squat = executable(&compiled.steps[0]);
        assert_eq!(squat.end_condition.condition_type_key, "iterations");
        assert_eq!(squat.end_condition_value, Some(12.0));
        assert_eq!(squat.step_type.step_type_key, "interval");

        let rest = executable(&compiled.steps[1]);
        assert_eq!(rest.step_type.step_type_key, "rest");
        assert_eq!(rest.end_condition.condition_type_key, "time");
        assert_eq!(compiled.estimated_seconds, 12.0 * 3.0 + 60.0);
    }

    #[test]
    fn repeat_groups_get_automatic_order() {
        let compiled = compile(&specs(json!([
            {"type": "repeat_group", "iterations": 2, "steps": [
                {"durationType": "time", "durationValue": 30,
                 "description": "Sprint", "stepType": "interval"},
                {"durationType": "time", "durationValue": 30, "description": "Rest"}
            ]}
        ])))
        .unwrap();

        let repeat = group(&compiled.steps[0]);
        assert_eq!(repeat.step_order, 1);
        assert_eq!(repeat.number_of_iterations, 2);
        assert_eq!(repeat.workout_steps[0].step_order(), 1);
        assert_eq!(repeat.workout_steps[1].step_order(), 2);
        assert_eq!(compiled.estimated_whole_seconds(), 120);
    }

    #[test]
    fn estimate_over_three_nested_levels() {
        // warmup 300
        // 2 × [ 30s + 3 × [ 10 reps (30s) + 20s ] ]  = 2 × (30 + 3 × 50) = 360
        // cooldown 120
        let compiled = compile(&[
            StepSpec::timed("warmup", 300, "Warm up"),
            StepSpec::repeat(
                2,
                vec![
                    StepSpec::timed("interval", 30, "Run"),
                    StepSpec::repeat(
                        3,
                        vec![
                            StepSpec::reps(10, "Burpees"),
                            StepSpec::timed("rest", 20, "Rest"),
                        ],
                    ),
                ],
            ),
            StepSpec::timed("cooldown", 120, "Cool down"),
        ])
        .unwrap();

        assert_eq!(compiled.estimated_seconds, 300.0 + 360.0 + 120.0);
        assert_eq!(compiled.counts(), (5, 2));
    }

    #[test]
    fn zero_repeat_count_is_rejected() {
        let err = compile(&[StepSpec::repeat(0, vec![StepSpec::reps(5, "Squat")])]).unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidRepeatCount {
                path: "steps[0]".into(),
                value: 0,
            }
        );
    }

    #[test]
    fn negative_repeat_count_is_rejected() {
        let err = compile(&specs(json!([
            {"numberOfIterations": -2, "workoutSteps": [{"reps": 5}]}
        ])))
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidRepeatCount { value: -2, .. }));
    }

    #[test]
    fn single_repeat_matches_unwrapped_estimate() {
        let children = vec![
            StepSpec::reps(12, "Lunges 6/leg"),
            StepSpec::timed("rest", 45, "Rest"),
        ];
        let wrapped = compile(&[StepSpec::repeat(1, children.clone())]).unwrap();
        let unwrapped = compile(&children).unwrap();

        assert_eq!(wrapped.estimated_seconds, unwrapped.estimated_seconds);
        assert_eq!(unwrapped.estimated_seconds, 12.0 * 2.0 * 3.0 + 45.0);
    }

    #[test]
    fn unknown_duration_type_fails() {
        let err = compile(&specs(json!([
            {"durationType": "laps", "durationValue": 3, "description": "Track"}
        ])))
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidDurationType { ref value, .. } if value == "laps"));
    }

    #[test]
    fn unknown_step_kind_fails_with_path() {
        let err = compile(&[StepSpec::repeat(
            2,
            vec![StepSpec {
                step_type: Some("sprintish".into()),
                seconds: Some(json!(10)),
                ..StepSpec::default()
            }],
        )])
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::InvalidStepKind {
                path: "steps[0].steps[0]".into(),
                value: "sprintish".into(),
            }
        );
    }

    #[test]
    fn seconds_and_reps_together_are_ambiguous() {
        let err = compile(&specs(json!([{"seconds": 30, "reps": 10}]))).unwrap_err();
        assert!(matches!(err, CompileError::AmbiguousDuration { .. }));
    }

    #[test]
    fn non_positive_duration_fails() {
        let err = compile(&specs(json!([{"seconds": 0}]))).unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidNumber { field: "seconds", .. }
        ));
    }

    #[test]
    fn missing_duration_fails() {
        let err = compile(&specs(json!([{"description": "Plank"}]))).unwrap_err();
        assert!(matches!(err, CompileError::MissingDuration { .. }));
    }

    #[test]
    fn empty_group_fails() {
        let err = compile(&[StepSpec::repeat(3, vec![])]).unwrap_err();
        assert_eq!(
            err,
            CompileError::EmptySteps {
                path: "steps[0].steps".into()
            }
        );
        assert!(matches!(compile(&[]), Err(CompileError::EmptySteps { .. })));
    }

    #[test]
    fn lap_button_step_has_no_value() {
        let compiled = compile(&specs(json!([
            {"durationType": "lap", "description": "Walk until ready"}
        ])))
        .unwrap();
        let step = executable(&compiled.steps[0]);

        assert_eq!(step.end_condition_value, None);
        assert_eq!(compiled.estimated_seconds, LAP_BUTTON_SECONDS);
    }

    #[test]
    fn heart_rate_zone_target() {
        let compiled = compile(&specs(json!([{"seconds": 600, "zone": 2}]))).unwrap();
        let step = executable(&compiled.steps[0]);

        assert_eq!(step.target_type.workout_target_type_key, "heart.rate");
        assert_eq!(step.zone_number, Some(2));
    }

    #[test]
    fn unsupported_zone_is_rejected() {
        let err = compile(&specs(json!([{"seconds": 600, "zone": 6}]))).unwrap_err();
        assert!(matches!(err, CompileError::InvalidTarget { .. }));

        let err = compile(&specs(json!([
            {"seconds": 600, "targetType": "cadence", "zone": 2}
        ])))
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidTarget { .. }));
    }

    #[test]
    fn nesting_is_bounded() {
        let mut node = StepSpec::reps(5, "Squat");
        for _ in 0..=MAX_NESTING_DEPTH {
            node = StepSpec::repeat(2, vec![node]);
        }
        let err = compile(&[node]).unwrap_err();
        assert!(matches!(err, CompileError::NestingTooDeep { .. }));
    }

    #[test]
    fn repeat_step_type_marks_a_group() {
        let compiled = compile(&specs(json!([
            {"type": "workout_step", "stepType": "repeat", "iterations": "3",
             "steps": [{"seconds": 20}]}
        ])))
        .unwrap();
        assert_eq!(group(&compiled.steps[0]).number_of_iterations, 3);
        assert_eq!(compiled.estimated_seconds, 60.0);
    }

    #[test]
    fn missing_description_uses_kind_label() {
        let compiled = compile(&specs(json!([{"kind": "cooldown", "seconds": "120"}]))).unwrap();
        assert_eq!(executable(&compiled.steps[0]).description, "Cool down");
    }

    #[test]
    fn serializes_remote_dto_tags() {
        let compiled = compile(&[StepSpec::repeat(2, vec![StepSpec::reps(8, "Push-ups")])]).unwrap();
        let json = serde_json::to_value(&compiled.steps).unwrap();

        assert_eq!(json[0]["type"], "RepeatGroupDTO");
        assert_eq!(json[0]["numberOfIterations"], 2);
        assert_eq!(json[0]["workoutSteps"][0]["type"], "ExecutableStepDTO");
        assert_eq!(
            json[0]["workoutSteps"][0]["endCondition"]["conditionTypeKey"],
            "iterations"
        );
    }
}
