//! Built-in workout templates.
//!
//! A template is a named step tree plus the name patterns that select it when
//! a workout is created without explicit steps.

use crate::model::{Sport, StepSpec};

use super::fold_name;

#[derive(Debug, Clone, Copy)]
pub struct WorkoutTemplate {
    /// Stable identifier, used by week plans.
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub sport: Sport,

    /// Folded substrings that select this template by workout name.
    pub patterns: &'static [&'static str],

    steps: fn() -> Vec<StepSpec>,
}

impl WorkoutTemplate {
    pub fn steps(&self) -> Vec<StepSpec> {
        (self.steps)()
    }

    pub fn matches_name(&self, name: &str) -> bool {
        let folded = fold_name(name);
        self.patterns.iter().any(|pattern| folded.contains(pattern))
    }
}

pub const TEMPLATES: [WorkoutTemplate; 4] = [
    WorkoutTemplate {
        key: "strength-a",
        name: "Strength A (Full Body)",
        description: "Circuit x3: squats, rows, reverse lunges, push-ups, plank",
        sport: Sport::Strength,
        patterns: &["strength a", "forca a"],
        steps: strength_a,
    },
    WorkoutTemplate {
        key: "strength-b",
        name: "Strength B (Full Body)",
        description: "Paired sets A/B plus a final core block",
        sport: Sport::Strength,
        patterns: &["strength b", "forca b"],
        steps: strength_b,
    },
    WorkoutTemplate {
        key: "strength-c",
        name: "Strength C (Metabolic)",
        description: "EMOM 20': 5 cycles x 4 minutes",
        sport: Sport::Hiit,
        patterns: &["strength c", "forca c"],
        steps: strength_c,
    },
    WorkoutTemplate {
        key: "easy-run",
        name: "Easy Run (Long)",
        description: "10' Z1 + 45' Z2 + 5' walking",
        sport: Sport::Running,
        patterns: &["easy run", "running suau"],
        steps: easy_run,
    },
];

/// Looks a template up by its key.
pub fn by_key(key: &str) -> Option<&'static WorkoutTemplate> {
    TEMPLATES.iter().find(|template| template.key == key)
}

/// The first template whose patterns match `name`.
pub fn by_name(name: &str) -> Option<&'static WorkoutTemplate> {
    TEMPLATES.iter().find(|template| template.matches_name(name))
}

fn zone_step(step_type: &str, seconds: u32, description: &str, zone: u8) -> StepSpec {
    StepSpec {
        zone: Some(zone.into()),
        ..StepSpec::timed(step_type, seconds, description)
    }
}

fn strength_a() -> Vec<StepSpec> {
    vec![
        StepSpec::timed("warmup", 8 * 60, "Warm up: joint mobility + jumping jacks"),
        StepSpec::repeat(
            3,
            vec![
                StepSpec::reps(15, "Squats (12-15 reps)"),
                StepSpec::reps(12, "Rows / assisted pull-ups (10-12 reps)"),
                StepSpec::reps(10, "Reverse lunges (10 per leg)"),
                StepSpec::reps(10, "Push-ups (8-10 reps)"),
                StepSpec::timed("interval", 45, "Plank"),
                StepSpec::timed("rest", 60, "Rest between rounds"),
            ],
        ),
        StepSpec::timed("cooldown", 5 * 60, "Cool down: gentle stretching"),
    ]
}

fn strength_b() -> Vec<StepSpec> {
    vec![
        StepSpec::timed("warmup", 8 * 60, "Warm up: mobility + trunk rotations"),
        StepSpec::repeat(
            3,
            vec![
                StepSpec::reps(10, "A1. Push-ups"),
                StepSpec::reps(8, "A2. Single-leg deadlift (8/leg)"),
                StepSpec::timed("rest", 45, "Rest after A2"),
            ],
        ),
        StepSpec::repeat(
            3,
            vec![
                StepSpec::reps(12, "B1. Shoulder press"),
                StepSpec::reps(15, "B2. Glute bridge"),
                StepSpec::timed("rest", 45, "Rest after B2"),
            ],
        ),
        StepSpec::repeat(
            3,
            vec![
                StepSpec::reps(20, "C1. Dead bug (total reps)"),
                StepSpec::timed("rest", 45, "Rest"),
            ],
        ),
        StepSpec::timed("cooldown", 5 * 60, "Cool down: chest and hip stretches"),
    ]
}

fn strength_c() -> Vec<StepSpec> {
    vec![
        StepSpec::timed("warmup", 8 * 60, "Warm up: dynamic mobility"),
        StepSpec::repeat(
            5,
            vec![
                StepSpec::timed("interval", 60, "Min 1: 15 jump squats"),
                StepSpec::timed("interval", 60, "Min 2: 10 burpees"),
                StepSpec::timed("interval", 60, "Min 3: 20 mountain climbers"),
                StepSpec::timed("rest", 60, "Min 4: full rest"),
            ],
        ),
        StepSpec::timed("cooldown", 5 * 60, "Cool down: breathing and heart rate down"),
    ]
}

fn easy_run() -> Vec<StepSpec> {
    vec![
        zone_step("warmup", 10 * 60, "Warm up: walk or very easy jog", 1),
        zone_step("interval", 45 * 60, "Continuous easy run", 2),
        StepSpec::timed("cooldown", 5 * 60, "Cool down: easy walk"),
    ]
}
