//! Daily health report: many health sections fetched in one call and folded
//! into a small summary with stable field names.

use std::collections::VecDeque;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Result, ToolError, success};
use crate::manager::{ManagerError, parse_date};
use crate::remote::FitnessService;

/// Sections queried in summary mode.
pub const SUMMARY_SECTIONS: [&str; 11] = [
    "stats_and_body",
    "user_summary",
    "sleep",
    "stress",
    "body_battery",
    "resting_heart_rate",
    "max_metrics",
    "training_status",
    "training_readiness",
    "endurance_score",
    "hill_score",
];

/// Sections full mode adds on top of [`SUMMARY_SECTIONS`].
pub const FULL_EXTRA_SECTIONS: [&str; 7] = [
    "steps_data",
    "floors",
    "heart_rates",
    "spo2",
    "respiration",
    "hydration",
    "hrv",
];

/// Object keys shown per section in the overview.
const OVERVIEW_KEYS: usize = 25;

/// Every known section, sorted.
pub fn valid_sections() -> Vec<&'static str> {
    let mut sections: Vec<&str> = SUMMARY_SECTIONS
        .iter()
        .chain(FULL_EXTRA_SECTIONS.iter())
        .copied()
        .collect();
    sections.sort_unstable();
    sections
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Summary,
    Full,
}

impl Mode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "summary" => Some(Self::Summary),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn sections(self) -> Vec<&'static str> {
        match self {
            Self::Summary => SUMMARY_SECTIONS.to_vec(),
            Self::Full => SUMMARY_SECTIONS
                .iter()
                .chain(FULL_EXTRA_SECTIONS.iter())
                .copied()
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HealthArgs {
    day: Option<String>,

    #[serde(default)]
    mode: Option<String>,

    /// Replaces the mode's section list when given.
    #[serde(default)]
    sections: Option<Vec<String>>,

    #[serde(default)]
    include_raw: bool,
}

/// Stable summary fields. `None` when no section reported the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthSummary {
    pub sleep_score: Option<f64>,
    pub sleep_total_seconds: Option<f64>,
    pub stress_average: Option<f64>,
    pub stress_max: Option<f64>,
    pub steps_total: Option<f64>,
    pub steps_goal: Option<f64>,
    pub floors_climbed: Option<f64>,
    pub body_battery_start: Option<f64>,
    pub body_battery_end: Option<f64>,
    pub body_battery_min: Option<f64>,
    pub body_battery_max: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub vo2max: Option<f64>,
    pub training_status: Option<Value>,
    pub training_readiness: Option<f64>,
    pub endurance_score: Option<f64>,
    pub hill_score: Option<f64>,
    pub spo2_average: Option<f64>,
    pub respiration_average: Option<f64>,
    pub hydration_ml: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionError {
    pub section: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub date: Date,
    pub mode: Mode,
    pub requested_sections: Vec<String>,
    pub available_sections: Vec<String>,
    pub unavailable_sections: Vec<String>,
    pub summary: HealthSummary,
    pub sections_overview: Map<String, Value>,
    pub errors: Vec<SectionError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections_data: Option<Map<String, Value>>,
}

/// The `health_report` tool.
pub fn report<R: FitnessService>(remote: &R, args: Value) -> Result<Value> {
    let args: HealthArgs = serde_json::from_value(args)?;
    let day = args.day.ok_or(ManagerError::MissingField("day"))?;
    let date = parse_date("day", &day)?;
    let mode = match args.mode.as_deref() {
        None => Mode::Summary,
        Some(raw) => Mode::parse(raw).ok_or_else(|| {
            ManagerError::Validation("mode must be 'summary' or 'full'".into())
        })?,
    };
    let sections = match args.sections {
        Some(requested) => select_sections(&requested)?,
        None => mode.sections().into_iter().map(str::to_string).collect(),
    };

    let report = build_report(remote, date, mode, sections, args.include_raw);
    success("health_report", report)
}

/// Resolves an explicit section list, rejecting unknown names.
fn select_sections(requested: &[String]) -> Result<Vec<String>> {
    let valid = valid_sections();
    let mut sections: Vec<String> = Vec::new();
    let mut unknown = Vec::new();
    for raw in requested {
        let candidate = raw.trim().to_lowercase();
        if !valid.contains(&candidate.as_str()) {
            unknown.push(raw.clone());
        } else if !sections.contains(&candidate) {
            sections.push(candidate);
        }
    }
    if unknown.is_empty() {
        Ok(sections)
    } else {
        Err(ToolError::UnknownSections { unknown })
    }
}

/// Fetches `sections` one by one. A failing section is recorded and treated
/// as unavailable; it never fails the report.
pub fn build_report<R: FitnessService>(
    remote: &R,
    date: Date,
    mode: Mode,
    sections: Vec<String>,
    include_raw: bool,
) -> HealthReport {
    let mut data = Map::new();
    let mut errors = Vec::new();
    for section in &sections {
        let value = remote.get_health_metrics(date, section).unwrap_or_else(|e| {
            tracing::warn!(%date, %section, error = %e, "health section failed");
            errors.push(SectionError {
                section: section.clone(),
                error: e.to_string(),
            });
            Value::Null
        });
        data.insert(section.clone(), value);
    }

    let (available_sections, unavailable_sections): (Vec<String>, Vec<String>) = sections
        .iter()
        .cloned()
        .partition(|section| !data[section].is_null());
    let sections_overview = data
        .iter()
        .map(|(name, value)| (name.clone(), section_overview(value)))
        .collect();

    HealthReport {
        date,
        mode,
        summary: summarize(&data),
        requested_sections: sections,
        available_sections,
        unavailable_sections,
        sections_overview,
        errors,
        sections_data: include_raw.then_some(data),
    }
}

fn summarize(data: &Map<String, Value>) -> HealthSummary {
    let pick = |section: &str, keys: &[&str]| data.get(section).and_then(|v| first_value(v, keys));
    let number = |section: &str, keys: &[&str]| as_number(pick(section, keys));

    let steps_keys = ["totalSteps", "steps", "stepsCount"];
    let battery = BodyBattery::from_section(data.get("body_battery"));

    HealthSummary {
        sleep_score: number("sleep", &["overallScore", "sleepScore", "score"]),
        sleep_total_seconds: number(
            "sleep",
            &["sleepTimeSeconds", "totalSleepSeconds", "sleepDuration"],
        ),
        stress_average: number(
            "stress",
            &["avgStressLevel", "averageStressLevel", "stressAvg"],
        ),
        stress_max: number("stress", &["maxStressLevel", "stressMax"]),
        steps_total: number("user_summary", &steps_keys)
            .or_else(|| number("stats_and_body", &steps_keys)),
        steps_goal: number("user_summary", &["dailyStepGoal", "stepsGoal"]),
        floors_climbed: number(
            "floors",
            &["climbed", "totalFloorsClimbed", "floorsClimbed"],
        ),
        body_battery_start: battery.as_ref().map(|b| b.start),
        body_battery_end: battery.as_ref().map(|b| b.end),
        body_battery_min: battery.as_ref().map(|b| b.min),
        body_battery_max: battery.as_ref().map(|b| b.max),
        resting_heart_rate: number("resting_heart_rate", &["value", "restingHeartRate", "rhr"]),
        vo2max: number("max_metrics", &["vo2Max", "vo2max", "maxVO2"]),
        training_status: pick("training_status", &["trainingStatus", "status", "overallStatus"])
            .cloned(),
        training_readiness: number(
            "training_readiness",
            &["overallScore", "score", "readinessScore"],
        ),
        endurance_score: number("endurance_score", &["score", "enduranceScore"]),
        hill_score: number("hill_score", &["score", "hillScore"]),
        spo2_average: number("spo2", &["averageSpO2", "avgSpo2", "spo2Avg"]),
        respiration_average: number(
            "respiration",
            &["avgRespirationValue", "averageRespiration", "respirationAvg"],
        ),
        hydration_ml: number(
            "hydration",
            &["valueInML", "consumedMilliliters", "totalHydration"],
        ),
    }
}

/// Breadth-first search for the first non-empty value under any of `keys`.
/// Key comparison ignores case.
fn first_value<'a>(data: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let wanted: Vec<String> = keys.iter().map(|key| key.to_lowercase()).collect();
    let mut queue = VecDeque::from([data]);
    while let Some(current) = queue.pop_front() {
        match current {
            Value::Object(fields) => {
                for (key, value) in fields {
                    let empty = value.is_null() || value.as_str() == Some("");
                    if !empty && wanted.contains(&key.to_lowercase()) {
                        return Some(value);
                    }
                    if value.is_object() || value.is_array() {
                        queue.push_back(value);
                    }
                }
            }
            Value::Array(items) => queue.extend(items),
            _ => {}
        }
    }
    None
}

/// Numbers, or strings holding one.
fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct BodyBattery {
    start: f64,
    end: f64,
    min: f64,
    max: f64,
}

impl BodyBattery {
    const VALUE_KEYS: [&'static str; 4] = ["bodyBatteryValue", "value", "bodyBattery", "charged"];

    /// Start, end and extremes over the readings of a body battery section.
    fn from_section(section: Option<&Value>) -> Option<Self> {
        let readings: Vec<f64> = section?
            .as_array()?
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|item| {
                let raw = Self::VALUE_KEYS
                    .iter()
                    .find_map(|key| item.get(*key).filter(|v| !v.is_null()));
                as_number(raw)
            })
            .collect();

        let (&start, &end) = (readings.first()?, readings.last()?);
        Some(Self {
            start,
            end,
            min: readings.iter().copied().fold(f64::INFINITY, f64::min),
            max: readings.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// The shape of a section without its data.
fn section_overview(value: &Value) -> Value {
    match value {
        Value::Object(fields) => json!({
            "type": "object",
            "keys": fields.keys().take(OVERVIEW_KEYS).collect::<Vec<_>>(),
        }),
        Value::Array(items) => {
            let sample_keys: Vec<&String> = items
                .first()
                .and_then(Value::as_object)
                .map(|first| first.keys().take(OVERVIEW_KEYS).collect())
                .unwrap_or_default();
            json!({"type": "array", "count": items.len(), "sampleKeys": sample_keys})
        }
        Value::Null => json!({"type": "null", "value": null}),
        Value::Bool(_) => json!({"type": "boolean", "value": value}),
        Value::Number(_) => json!({"type": "number", "value": value}),
        Value::String(_) => json!({"type": "string", "value": value}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::remote::RemoteError;
    use crate::remote::fake::FakeService;
    use crate::tools::{call, is_error, tests::test_manager};

    fn remote_with(sections: &[(&str, Value)]) -> FakeService {
        let remote = FakeService::new();
        for (name, value) in sections {
            remote
                .state
                .borrow_mut()
                .health
                .insert((*name).to_string(), value.clone());
        }
        remote
    }

    #[test]
    fn summary_finds_nested_values() {
        let remote = remote_with(&[
            (
                "sleep",
                json!({"dailySleepDTO": {"sleepTimeSeconds": 27000, "sleepScores": {"overallScore": 82}}}),
            ),
            ("stress", json!({"avgStressLevel": 31, "maxStressLevel": "88"})),
            ("stats_and_body", json!({"totalSteps": 9120})),
            ("max_metrics", json!([{"generic": {"vo2MaxPreciseValue": 50.4, "vo2Max": 50}}])),
            ("training_status", json!({"latest": {"trainingStatus": "PRODUCTIVE"}})),
        ]);

        let report = build_report(
            &remote,
            jiff::civil::date(2026, 2, 16),
            Mode::Summary,
            Mode::Summary.sections().into_iter().map(str::to_string).collect(),
            false,
        );

        assert_eq!(report.summary.sleep_score, Some(82.0));
        assert_eq!(report.summary.sleep_total_seconds, Some(27000.0));
        assert_eq!(report.summary.stress_average, Some(31.0));
        assert_eq!(report.summary.stress_max, Some(88.0));
        assert_eq!(report.summary.steps_total, Some(9120.0));
        assert_eq!(report.summary.vo2max, Some(50.0));
        assert_eq!(report.summary.training_status, Some(json!("PRODUCTIVE")));
        assert_eq!(report.summary.hill_score, None);
        assert_eq!(report.available_sections.len(), 5);
        assert_eq!(report.unavailable_sections.len(), SUMMARY_SECTIONS.len() - 5);
        assert!(report.sections_data.is_none());
    }

    #[test]
    fn empty_values_are_skipped() {
        let data = json!({"score": "", "nested": {"score": 7}});
        assert_eq!(first_value(&data, &["SCORE"]), Some(&json!(7)));
        assert_eq!(first_value(&json!({"other": 1}), &["score"]), None);
    }

    #[test]
    fn body_battery_summary() {
        let section = json!([
            {"bodyBatteryValue": 40},
            {"value": 80},
            "noise",
            {"charged": 25},
            {"unrelated": 99},
        ]);
        let battery = BodyBattery::from_section(Some(&section)).unwrap();
        assert_eq!(
            battery,
            BodyBattery {
                start: 40.0,
                end: 25.0,
                min: 25.0,
                max: 80.0,
            }
        );
        assert_eq!(BodyBattery::from_section(Some(&json!({"value": 1}))), None);
        assert_eq!(BodyBattery::from_section(Some(&json!([]))), None);
    }

    #[test]
    fn overview_describes_shape() {
        assert_eq!(
            section_overview(&json!([{"b": 1, "a": 2}, {}])),
            json!({"type": "array", "count": 2, "sampleKeys": ["a", "b"]})
        );
        assert_eq!(
            section_overview(&json!({"x": 1})),
            json!({"type": "object", "keys": ["x"]})
        );
        assert_eq!(section_overview(&json!(3)), json!({"type": "number", "value": 3}));
    }

    #[test]
    fn failing_sections_are_reported_not_fatal() {
        let remote = FakeService::new();
        remote.fail("health", RemoteError::Unavailable("down".into()));

        let report = build_report(
            &remote,
            jiff::civil::date(2026, 2, 16),
            Mode::Full,
            Mode::Full.sections().into_iter().map(str::to_string).collect(),
            true,
        );

        assert_eq!(report.errors.len(), SUMMARY_SECTIONS.len() + FULL_EXTRA_SECTIONS.len());
        assert!(report.available_sections.is_empty());
        assert_eq!(report.sections_data.unwrap().len(), report.errors.len());
    }

    #[test]
    fn explicit_sections_replace_mode() {
        let mut manager = test_manager();
        let response = call(
            &mut manager,
            "health_report",
            json!({"day": "2026-02-16", "mode": "full", "sections": ["SLEEP", "hrv", "sleep"]}),
        );

        assert_eq!(response["status"], "success");
        assert_eq!(response["requestedSections"], json!(["sleep", "hrv"]));
        assert_eq!(response["mode"], "full");
        assert_eq!(manager.remote().calls(), vec!["health", "health"]);
    }

    #[test]
    fn unknown_sections_list_valid_ones() {
        let mut manager = test_manager();
        let response = call(
            &mut manager,
            "health_report",
            json!({"day": "2026-02-16", "sections": ["sleep", "mood"]}),
        );

        assert!(is_error(&response));
        assert_eq!(response["kind"], "validation");
        assert_eq!(response["unknownSections"], json!(["mood"]));
        assert_eq!(response["validSections"], json!(valid_sections()));
        assert!(manager.remote().calls().is_empty());
    }

    #[test]
    fn bad_day_and_mode_are_rejected() {
        let mut manager = test_manager();

        let response = call(&mut manager, "health_report", json!({"day": "16-02-2026"}));
        assert_eq!(response["kind"], "validation");

        let response = call(&mut manager, "health_report", json!({}));
        assert_eq!(response["error"], "day is required");

        let response = call(
            &mut manager,
            "health_report",
            json!({"day": "2026-02-16", "mode": "verbose"}),
        );
        assert_eq!(response["error"], "mode must be 'summary' or 'full'");
    }
}
