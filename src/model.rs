//! Core data model for Coach.
//!
//! Step input as callers send it, the compiled step and payload shapes the
//! remote service expects, sport types, and rows of the scheduled index.

mod compiled;
mod payload;
mod scheduled;
mod sport;
mod step;

pub use compiled::{
    CompiledStep, EndConditionRef, ExecutableStep, RepeatGroupStep, StepTypeRef, TargetRef,
};
pub use payload::{WorkoutPayload, WorkoutSegment};
pub use scheduled::{EntryKey, EntryPatch, ScheduledEntry};
pub use sport::{Sport, SportTypeRef, UnknownSport};
pub use step::StepSpec;
