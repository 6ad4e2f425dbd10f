//! Compiled steps: the nested step representation the remote service expects.
//!
//! These are produced by the compiler and never assembled by hand elsewhere.

use serde::{Deserialize, Serialize};

/// One compiled node, tagged the way the remote service tags step DTOs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompiledStep {
    #[serde(rename = "ExecutableStepDTO")]
    Executable(ExecutableStep),

    #[serde(rename = "RepeatGroupDTO")]
    RepeatGroup(RepeatGroupStep),
}

impl CompiledStep {
    pub fn step_order(&self) -> u32 {
        match self {
            Self::Executable(step) => step.step_order,
            Self::RepeatGroup(group) => group.step_order,
        }
    }
}

/// A leaf step with an end condition and an optional target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableStep {
    pub step_order: u32,
    pub description: String,
    pub step_type: StepTypeRef,
    pub end_condition: EndConditionRef,

    /// `None` for lap-button steps, which end when the athlete presses lap.
    pub end_condition_value: Option<f64>,

    pub target_type: TargetRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_number: Option<u8>,
}

/// A group of steps repeated `number_of_iterations` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatGroupStep {
    pub step_order: u32,
    pub step_type: StepTypeRef,
    pub number_of_iterations: u32,
    pub workout_steps: Vec<CompiledStep>,
    pub end_condition: EndConditionRef,
    pub end_condition_value: f64,
    pub smart_repeat: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepTypeRef {
    pub step_type_id: u32,
    pub step_type_key: String,
    pub display_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndConditionRef {
    pub condition_type_id: u32,
    pub condition_type_key: String,
    pub display_order: u32,
    pub displayable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    pub workout_target_type_id: u32,
    pub workout_target_type_key: String,
    pub display_order: u32,
}
