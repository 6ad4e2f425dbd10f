//! Alias tables and remote constants for steps, end conditions, and targets.
//!
//! Every alias lookup goes through [`normalize_token`] first, so `Warm-Up`,
//! `warm up` and `warm_up` resolve alike.

use crate::model::{EndConditionRef, StepTypeRef, TargetRef};

/// Lowercases and folds `-` and spaces into `_`.
pub fn normalize_token(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Whether a node is a leaf step or a repeat group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Step,
    RepeatGroup,
}

impl NodeKind {
    pub fn from_alias(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "workout_step" | "step" | "executablestepdto" => Some(Self::Step),
            "repeat_group" | "repeat" | "repeatgroupdto" => Some(Self::RepeatGroup),
            _ => None,
        }
    }

    /// `stepType` values that mark a node as a group even without `type`.
    pub fn is_repeat_step_type(raw: &str) -> bool {
        matches!(
            normalize_token(raw).as_str(),
            "repeat" | "repeat_group" | "repeatgroupdto"
        )
    }
}

/// The kind of a step as the remote service classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Warmup,
    Cooldown,
    Interval,
    Recovery,
    Rest,
    Repeat,
}

impl StepKind {
    pub const ALLOWED: &'static str = "cooldown, interval, recovery, rest, warmup";

    /// Resolves a leaf step kind. `repeat` is not a leaf kind.
    pub fn from_alias(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "warmup" | "warm_up" => Some(Self::Warmup),
            "cooldown" | "cool_down" => Some(Self::Cooldown),
            "interval" | "work" | "active" | "workout_step" => Some(Self::Interval),
            "recovery" => Some(Self::Recovery),
            "rest" => Some(Self::Rest),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Cooldown => "cooldown",
            Self::Interval => "interval",
            Self::Recovery => "recovery",
            Self::Rest => "rest",
            Self::Repeat => "repeat",
        }
    }

    /// Description used when the caller gives none.
    pub fn default_description(self) -> &'static str {
        match self {
            Self::Warmup => "Warm up",
            Self::Cooldown => "Cool down",
            Self::Interval => "Interval",
            Self::Recovery => "Recovery",
            Self::Rest => "Rest",
            Self::Repeat => "Repeat",
        }
    }

    pub fn type_ref(self) -> StepTypeRef {
        let id = match self {
            Self::Warmup => 1,
            Self::Cooldown => 2,
            Self::Interval => 3,
            Self::Recovery => 4,
            Self::Rest => 5,
            Self::Repeat => 6,
        };
        StepTypeRef {
            step_type_id: id,
            step_type_key: self.key().to_string(),
            display_order: id,
        }
    }
}

/// How a leaf step ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Time,
    Iterations,
    Distance,
    Calories,
    HeartRate,
    Cadence,
    Power,
    LapButton,
}

impl Condition {
    pub const ALLOWED: &'static str =
        "cadence, calories, distance, heart_rate, iterations, lap_button, power, time";

    pub fn from_alias(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "time" | "seconds" | "sec" => Some(Self::Time),
            "reps" | "rep" | "iterations" => Some(Self::Iterations),
            "distance" => Some(Self::Distance),
            "calories" => Some(Self::Calories),
            "heart_rate" => Some(Self::HeartRate),
            "cadence" => Some(Self::Cadence),
            "power" => Some(Self::Power),
            "lap_button" | "lap" | "lapbutton" | "button" | "button_press" | "open" => {
                Some(Self::LapButton)
            }
            _ => None,
        }
    }

    /// Lap-button steps carry no end-condition value.
    pub fn takes_value(self) -> bool {
        self != Self::LapButton
    }

    pub fn end_condition(self) -> EndConditionRef {
        // The remote service models "press lap to continue" as an open
        // iterations condition with no value.
        let (id, key, display_order) = match self {
            Self::Distance => (1, "distance", 2),
            Self::Time => (2, "time", 2),
            Self::HeartRate => (3, "heart.rate", 2),
            Self::Calories => (4, "calories", 2),
            Self::Cadence => (5, "cadence", 2),
            Self::Power => (6, "power", 2),
            Self::Iterations => (7, "iterations", 2),
            Self::LapButton => (7, "iterations", 7),
        };
        EndConditionRef {
            condition_type_id: id,
            condition_type_key: key.to_string(),
            display_order,
            displayable: true,
        }
    }

    /// The end condition of a repeat group.
    pub fn repeat_end_condition() -> EndConditionRef {
        EndConditionRef {
            condition_type_id: 7,
            condition_type_key: "iterations".to_string(),
            display_order: 7,
            displayable: false,
        }
    }
}

/// What the athlete aims for during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    NoTarget,
    HeartRate,
    Cadence,
    Speed,
    Power,
    Open,
}

impl Target {
    pub const ALLOWED: &'static str = "cadence, heart_rate, no_target, open, power, speed";

    /// Heart-rate zones the remote service accepts.
    pub const ZONES: std::ops::RangeInclusive<u8> = 1..=5;

    pub fn from_alias(raw: &str) -> Option<Self> {
        match normalize_token(raw).as_str() {
            "no_target" | "no.target" | "none" => Some(Self::NoTarget),
            "heart_rate" | "hr" | "heart_rate_zone" => Some(Self::HeartRate),
            "cadence" => Some(Self::Cadence),
            "speed" => Some(Self::Speed),
            "power" => Some(Self::Power),
            "open" => Some(Self::Open),
            _ => None,
        }
    }

    pub fn type_ref(self) -> TargetRef {
        let (id, key, display_order) = match self {
            Self::NoTarget => (1, "no.target", 1),
            Self::Power => (2, "power", 5),
            Self::Cadence => (3, "cadence", 3),
            Self::HeartRate => (4, "heart.rate", 2),
            Self::Speed => (5, "speed", 4),
            Self::Open => (6, "open", 6),
        };
        TargetRef {
            workout_target_type_id: id,
            workout_target_type_key: key.to_string(),
            display_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("warmup", StepKind::Warmup)]
    #[case("Warm-Up", StepKind::Warmup)]
    #[case("cool down", StepKind::Cooldown)]
    #[case("work", StepKind::Interval)]
    #[case("workout_step", StepKind::Interval)]
    #[case("REST", StepKind::Rest)]
    fn resolves_step_kinds(#[case] raw: &str, #[case] expected: StepKind) {
        assert_eq!(StepKind::from_alias(raw), Some(expected));
    }

    #[test]
    fn repeat_is_not_a_leaf_kind() {
        assert_eq!(StepKind::from_alias("repeat"), None);
        assert!(NodeKind::is_repeat_step_type("Repeat"));
    }

    #[rstest]
    #[case("sec", Condition::Time)]
    #[case("rep", Condition::Iterations)]
    #[case("heart-rate", Condition::HeartRate)]
    #[case("lap", Condition::LapButton)]
    #[case("open", Condition::LapButton)]
    fn resolves_conditions(#[case] raw: &str, #[case] expected: Condition) {
        assert_eq!(Condition::from_alias(raw), Some(expected));
    }

    #[test]
    fn unknown_condition_is_rejected() {
        assert_eq!(Condition::from_alias("laps"), None);
    }

    #[test]
    fn lap_button_maps_to_open_iterations() {
        let condition = Condition::LapButton.end_condition();
        assert_eq!(condition.condition_type_key, "iterations");
        assert_eq!(condition.display_order, 7);
        assert!(!Condition::LapButton.takes_value());
    }

    #[test]
    fn target_aliases() {
        assert_eq!(Target::from_alias("no.target"), Some(Target::NoTarget));
        assert_eq!(Target::from_alias("HR"), Some(Target::HeartRate));
        assert_eq!(Target::from_alias("pace"), None);
    }
}
