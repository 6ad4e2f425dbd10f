//! Round shorthand: folds `Round 1: ...`, `Round 2: ...` runs into a repeat group.
//!
//! Agents often describe circuits as one leaf per round with the exercises in
//! the description, e.g. `Round 1: 10 squats, 30s plank`, optionally followed
//! by a timed rest step after each round. When every round in a run has the
//! same text, is numbered 1..n with n >= 2, and every exercise parses, the run
//! is replaced by a single repeat group of n iterations. Anything else is left
//! untouched for the compiler to handle as written.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{mentions_rest, tables::Condition};
use crate::model::StepSpec;

/// Rest between rounds when the rest step carries no usable value.
const DEFAULT_ROUND_REST_SECONDS: f64 = 60.0;

const DEFAULT_ROUND_REST_DESCRIPTION: &str = "Rest between rounds";

static ROUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:round|ronda)\s*(\d+)\s*[:\-]\s*(.+)$").expect("Invalid regex pattern")
});

static SECONDS_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^(\d+)\s*(?:s|sec|secs|seg|segon|segons|")\s+(.+)$"#)
        .expect("Invalid regex pattern")
});

static PER_SIDE_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)\s*/\s*(cama|leg|side)\s+(.+)$").expect("Invalid regex pattern")
});

static REPS_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+)(?:\s*-\s*\d+)?\s*reps?\s+(.+)$").expect("Invalid regex pattern")
});

static REPS_LAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s*\((\d+)(?:\s*-\s*\d+)?\s*reps?\)\s*$").expect("Invalid regex pattern")
});

static SECONDS_LAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)\s*\((\d+)\s*(?:s|sec|secs|seg|segons?)\)\s*$")
        .expect("Invalid regex pattern")
});

static COUNT_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(.+)$").expect("Invalid regex pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

/// Rewrites round shorthand runs in a top-level step list.
pub fn normalize(steps: &[StepSpec]) -> Vec<StepSpec> {
    let mut normalized = Vec::with_capacity(steps.len());
    let mut index = 0;

    while index < steps.len() {
        if round_descriptor(&steps[index]).is_none() {
            normalized.push(steps[index].clone());
            index += 1;
            continue;
        }

        match fold_run(&steps[index..]) {
            Some((group, consumed)) => {
                tracing::debug!(rounds = ?group.iterations, consumed, "folded round shorthand");
                normalized.push(group);
                index += consumed;
            }
            None => {
                normalized.push(steps[index].clone());
                index += 1;
            }
        }
    }

    normalized
}

/// Folds the run starting at `steps[0]`. Returns the group and the number of
/// input nodes it replaces.
fn fold_run(steps: &[StepSpec]) -> Option<(StepSpec, usize)> {
    let mut index = 0;
    let mut rounds: u32 = 0;
    let mut first_text: Option<(String, String)> = None;
    let mut rest: Option<&StepSpec> = None;

    while let Some((number, text)) = steps.get(index).and_then(round_descriptor) {
        if number != rounds + 1 {
            return None;
        }
        let folded = fold_whitespace(&text);
        match &first_text {
            None => first_text = Some((text, folded)),
            Some((_, expected)) if *expected == folded => {}
            Some(_) => return None,
        }

        rounds += 1;
        index += 1;

        if let Some(next) = steps.get(index).filter(|node| is_round_rest(node)) {
            if rest.is_none() {
                rest = Some(next);
            }
            index += 1;
        }
    }

    if rounds < 2 {
        return None;
    }
    let (text, _) = first_text?;
    let mut children = parse_exercises(&text)?;
    if let Some(rest_step) = rest.and_then(round_rest_step) {
        children.push(rest_step);
    }

    let group = StepSpec {
        step_order: steps[0].step_order.clone(),
        ..StepSpec::repeat(i64::from(rounds), children)
    };
    Some((group, index))
}

fn round_descriptor(node: &StepSpec) -> Option<(u32, String)> {
    let description = node.description.as_deref()?;
    let captures = ROUND.captures(description.trim())?;
    let number = captures[1].parse().ok()?;
    Some((number, captures[2].trim().to_string()))
}

fn fold_whitespace(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

fn is_round_rest(node: &StepSpec) -> bool {
    let timed = node.seconds.is_some()
        || node
            .duration_type
            .as_deref()
            .and_then(Condition::from_alias)
            .is_some_and(|condition| condition == Condition::Time);
    timed && node.description.as_deref().is_some_and(mentions_rest)
}

fn round_rest_step(node: &StepSpec) -> Option<StepSpec> {
    let raw = node.seconds.as_ref().or(node.duration_value.as_ref());
    let seconds = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(DEFAULT_ROUND_REST_SECONDS);

    if seconds <= 0.0 {
        return None;
    }
    let description = node
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(DEFAULT_ROUND_REST_DESCRIPTION);

    Some(StepSpec {
        node_type: Some("workout_step".into()),
        step_type: Some("rest".into()),
        description: Some(description.to_string()),
        duration_type: Some("time".into()),
        duration_value: Some(Value::from(seconds)),
        ..StepSpec::default()
    })
}

/// Parses `10 squats, 30s plank; Lunges (8 reps)` into leaf steps.
///
/// Returns `None` if any item is unrecognized, so that a half-parsed round
/// never replaces what the caller wrote.
fn parse_exercises(text: &str) -> Option<Vec<StepSpec>> {
    let items: Vec<&str> = text
        .split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return None;
    }
    items.into_iter().map(parse_exercise).collect()
}

fn parse_exercise(item: &str) -> Option<StepSpec> {
    let token = item.trim().trim_matches('.');
    if token.is_empty() {
        return None;
    }

    if let Some(c) = SECONDS_FIRST.captures(token) {
        return leaf("time", &c[1], c[2].trim());
    }
    if let Some(c) = PER_SIDE_FIRST.captures(token) {
        let side = c[2].to_lowercase();
        return leaf("reps", &c[1], &format!("{} (per {side})", c[3].trim()));
    }
    if let Some(c) = REPS_FIRST.captures(token) {
        return leaf("reps", &c[1], c[2].trim());
    }
    if let Some(c) = REPS_LAST.captures(token) {
        return leaf("reps", &c[2], c[1].trim());
    }
    if let Some(c) = SECONDS_LAST.captures(token) {
        return leaf("time", &c[2], c[1].trim());
    }
    if let Some(c) = COUNT_FIRST.captures(token) {
        return leaf("reps", &c[1], c[2].trim());
    }
    None
}

fn leaf(duration_type: &str, value: &str, description: &str) -> Option<StepSpec> {
    let value: u32 = value.parse().ok()?;
    Some(StepSpec {
        node_type: Some("workout_step".into()),
        description: Some(description.to_string()),
        duration_type: Some(duration_type.into()),
        duration_value: Some(Value::from(value)),
        ..StepSpec::default()
    })
}
