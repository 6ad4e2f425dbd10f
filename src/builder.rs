//! Payload builder: turns a workout request into a complete remote payload.
//!
//! Three sources of steps, tried in order:
//!
//! 1. Explicit structured steps, after round shorthand normalization.
//! 2. A built-in template selected by the workout name.
//! 3. A generic warm-up / main block / cool-down fallback sized from the
//!    requested duration.
//!
//! The requested sport goes through the [`SportPolicy`] and the payload always
//! carries the applied sport. Pure: no I/O.

pub mod template;

use serde::Serialize;

use crate::compile::{self, CompileError, CompiledSteps};
use crate::model::{Sport, StepSpec, WorkoutPayload};
use crate::policy::{SportPolicy, SportRejected, SportResolution};

pub use template::WorkoutTemplate;

/// Bounds for the fallback workout length, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 10;
pub const MAX_DURATION_MINUTES: u32 = 480;

pub const DEFAULT_DURATION_MINUTES: u32 = 45;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    SportRejected(#[from] SportRejected),
}

pub type Result<T> = core::result::Result<T, BuildError>;

/// What to build.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutRequest {
    pub name: String,
    pub sport: Sport,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub steps: Option<Vec<StepSpec>>,
}

impl WorkoutRequest {
    pub fn new(name: impl Into<String>, sport: Sport) -> Self {
        Self {
            name: name.into(),
            sport,
            description: None,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            steps: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: Vec<StepSpec>) -> Self {
        self.steps = Some(steps);
        self
    }

    #[must_use]
    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// A request built from a template, keeping the template's sport.
    pub fn from_template(template: &WorkoutTemplate) -> Self {
        Self::new(template.name, template.sport)
            .with_description(template.description)
            .with_steps(template.steps())
    }
}

/// Where the steps of a built workout came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "template")]
pub enum StepSource {
    Structured,
    Template(&'static str),
    Fallback,
}

/// A payload ready for the remote service, plus what the caller needs to know
/// about how it was built.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltWorkout {
    pub payload: WorkoutPayload,
    pub sport: SportResolution,
    pub source: StepSource,
}

impl BuiltWorkout {
    pub fn structured_steps_applied(&self) -> bool {
        self.source == StepSource::Structured
    }

    pub fn warning(&self) -> Option<&str> {
        self.sport.warning.as_deref()
    }
}

/// Builds a payload for `request`.
pub fn build(request: &WorkoutRequest, policy: &SportPolicy) -> Result<BuiltWorkout> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(BuildError::Validation("name is required".into()));
    }
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let sport = policy.resolve(request.sport)?;

    let (compiled, source, description) = if let Some(steps) = &request.steps {
        let compiled = compile::compile(&compile::shorthand::normalize(steps))?;
        let description = description.map_or_else(|| summarize(&compiled), str::to_string);
        (compiled, StepSource::Structured, description)
    } else if let Some(template) = template::by_name(name) {
        let compiled = compile::compile(&template.steps())?;
        let description = description.unwrap_or(template.description).to_string();
        (compiled, StepSource::Template(template.key), description)
    } else {
        let Some(description) = description else {
            return Err(BuildError::Validation(
                "description is required when neither steps nor a template apply".into(),
            ));
        };
        let compiled = compile::compile(&fallback_steps(request.duration_minutes))?;
        (compiled, StepSource::Fallback, description.to_string())
    };

    let estimated = match compiled.estimated_whole_seconds() {
        0 => request.duration_minutes.saturating_mul(60),
        seconds => seconds,
    };

    tracing::debug!(
        workout = name,
        source = ?source,
        estimated,
        requested = %sport.requested,
        applied = %sport.applied,
        "built workout payload"
    );

    Ok(BuiltWorkout {
        payload: WorkoutPayload::single_segment(
            name,
            &description,
            sport.applied,
            estimated,
            compiled.steps,
        ),
        sport,
        source,
    })
}

/// Warm-up, main block and cool-down filling `duration_minutes`, clamped.
pub fn fallback_steps(duration_minutes: u32) -> Vec<StepSpec> {
    let total = duration_minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES) * 60;
    let (mut warmup, mut cooldown) = (5 * 60, 5 * 60);
    if total - warmup - cooldown < 60 {
        (warmup, cooldown) = (2 * 60, 2 * 60);
    }
    let main = total - warmup - cooldown;

    vec![
        StepSpec::timed("warmup", warmup, "Warm up"),
        StepSpec::timed("interval", main, "Main block"),
        StepSpec::timed("cooldown", cooldown, "Cool down"),
    ]
}

/// Summary used as the description of structured workouts that have none.
pub fn summarize(compiled: &CompiledSteps) -> String {
    let (steps, groups) = compiled.counts();
    let minutes = (compiled.estimated_seconds / 60.0).round();
    format!("Structured workout: {steps} steps, {groups} repeat groups, ~{minutes} min")
}

/// Lowercases a workout name and folds accented letters, so `Força` matches `forca`.
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            'ç' => 'c',
            'à' | 'á' | 'â' | 'ä' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
